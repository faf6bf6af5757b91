use crate::cadence::Cadence;
use crate::config::{ClassifierConfig, Config, DownstreamConfig, FrameSourceConfig};
use crate::control_surface::{self, ControlState};
use crate::downstream_action::impl_command::DownstreamActionCommand;
use crate::downstream_action::impl_fake::DownstreamActionFake;
use crate::downstream_action::interface::DownstreamAction;
use crate::error::Error;
use crate::frame_buffer::FrameBuffer;
use crate::frame_source::impl_fake::FrameSourceFake;
use crate::frame_source::impl_zmq::FrameSourceZmq;
use crate::frame_source::interface::FrameSource;
use crate::frame_subscriber::FrameSubscriber;
use crate::image_classifier::impl_fake::ImageClassifierFake;
use crate::image_classifier::impl_tract_onnx::ImageClassifierTractOnnx;
use crate::image_classifier::interface::ImageClassifier;
use crate::inference_scheduler::main::InferenceScheduler;
use crate::inference_scheduler::stats::LatencyStats;
use crate::library::logger::interface::Logger;
use crate::result_store::impl_sqlite::ResultStoreSqlite;
use crate::result_store::interface::ResultStore;
use crate::shutdown::Shutdown;
use chrono::Local;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub struct App {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    shutdown: Shutdown,
    cadence: Cadence,
    frame_buffer: Arc<FrameBuffer>,
    latency_stats: Arc<LatencyStats>,
    frame_source: Arc<dyn FrameSource + Send + Sync>,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    result_store: Arc<dyn ResultStore + Send + Sync>,
    downstream_action: Arc<dyn DownstreamAction + Send + Sync>,
}

impl App {
    /// Builds every component and prepares the result database.
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        shutdown: Shutdown,
    ) -> Result<Self, Error> {
        let result_store = open_result_store(&config, &logger)?;

        Ok(Self {
            cadence: Cadence::new(config.scheduler.prediction_interval_secs),
            frame_buffer: Arc::new(FrameBuffer::new(
                config.buffer.min_len,
                config.buffer.max_len(),
            )),
            latency_stats: Arc::new(LatencyStats::new(config.scheduler.latency_window)),
            frame_source: build_frame_source(&config.subscriber.source, &logger),
            image_classifier: build_image_classifier(&config.classifier, &logger)?,
            downstream_action: build_downstream_action(&config.downstream, &logger),
            result_store,
            config,
            logger,
            shutdown,
        })
    }

    /// Runs until shutdown. Any worker failing takes the others down with it.
    pub fn run(self) -> Result<(), Error> {
        let scheduler = InferenceScheduler::new(
            self.config.scheduler.clone(),
            self.logger.clone(),
            self.frame_buffer.clone(),
            self.cadence.clone(),
            self.shutdown.clone(),
            self.image_classifier.clone(),
            self.result_store.clone(),
            self.downstream_action.clone(),
            self.latency_stats.clone(),
        );
        let subscriber = FrameSubscriber::new(
            self.logger.clone(),
            self.frame_source.clone(),
            self.frame_buffer.clone(),
            self.shutdown.clone(),
            self.config.subscriber.poll_timeout(),
        );

        let scheduler_handle =
            spawn_worker("inference-scheduler", self.shutdown.clone(), move || {
                scheduler.run()
            })?;
        let subscriber_handle =
            spawn_worker("frame-subscriber", self.shutdown.clone(), move || {
                subscriber.run()
            })?;

        let served = self.serve_control_surface();
        if let Err(err) = &served {
            self.logger
                .error(&format!("Control surface failed: {}", err));
            self.shutdown.trigger();
        }

        let scheduler_result = join_worker(scheduler_handle, "inference scheduler");
        let subscriber_result = join_worker(subscriber_handle, "frame subscriber");

        served.and(scheduler_result).and(subscriber_result)
    }

    fn serve_control_surface(&self) -> Result<(), Error> {
        let state = ControlState {
            logger: self.logger.with_namespace("control_surface"),
            cadence: self.cadence.clone(),
            frame_buffer: self.frame_buffer.clone(),
            latency_stats: self.latency_stats.clone(),
            result_store: self.result_store.clone(),
            model_id: self.image_classifier.model_id(),
        };
        let listen = self.config.control.listen;
        let shutdown = self.shutdown.clone();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        runtime.block_on(async move {
            let listener = control_surface::bind(listen).await?;
            control_surface::serve(listener, state, shutdown).await
        })
    }
}

fn open_result_store(
    config: &Config,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> Result<Arc<dyn ResultStore + Send + Sync>, Error> {
    let store = ResultStoreSqlite::open(&config.store.db_path, logger.clone()).map_err(Error::Store)?;
    store.init().map_err(Error::Store)?;

    let cutoff = chrono::TimeDelta::try_days(config.store.retention_days)
        .and_then(|retention| Local::now().checked_sub_signed(retention))
        .ok_or_else(|| {
            Error::Config(format!(
                "store.retention_days out of range: {}",
                config.store.retention_days
            ))
        })?;
    let pruned = store
        .prune(cutoff.naive_local())
        .map_err(Error::Store)?;
    logger.info(&format!(
        "Pruned {} results older than {} days",
        pruned, config.store.retention_days
    ));

    Ok(Arc::new(store))
}

fn build_frame_source(
    config: &FrameSourceConfig,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn FrameSource + Send + Sync> {
    match config {
        FrameSourceConfig::Zmq {
            endpoint,
            receive_high_water_mark,
        } => Arc::new(FrameSourceZmq::new(
            endpoint,
            *receive_high_water_mark,
            logger.clone(),
        )),
        FrameSourceConfig::Fake {
            interval_ms,
            frame_size,
        } => Arc::new(FrameSourceFake::random(
            Duration::from_millis(*interval_ms),
            *frame_size,
            logger.clone(),
        )),
    }
}

fn build_image_classifier(
    config: &ClassifierConfig,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> Result<Arc<dyn ImageClassifier + Send + Sync>, Error> {
    match config {
        ClassifierConfig::Onnx(model) => Ok(Arc::new(
            ImageClassifierTractOnnx::new(model, logger.clone()).map_err(Error::Classifier)?,
        )),
        ClassifierConfig::Fake => Ok(Arc::new(ImageClassifierFake::random())),
    }
}

fn build_downstream_action(
    config: &DownstreamConfig,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn DownstreamAction + Send + Sync> {
    match config {
        DownstreamConfig::Command { program } => {
            Arc::new(DownstreamActionCommand::new(program.clone(), logger.clone()))
        }
        DownstreamConfig::Fake => Arc::new(DownstreamActionFake::new(logger.clone())),
    }
}

/// Triggers shutdown when dropped, including while unwinding from a panic.
struct ShutdownOnExit(Shutdown);

impl Drop for ShutdownOnExit {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

fn spawn_worker<F>(
    name: &str,
    shutdown: Shutdown,
    work: F,
) -> Result<JoinHandle<Result<(), Error>>, Error>
where
    F: FnOnce() -> Result<(), Error> + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _guard = ShutdownOnExit(shutdown);
            work()
        })?;
    Ok(handle)
}

fn join_worker(handle: JoinHandle<Result<(), Error>>, name: &'static str) -> Result<(), Error> {
    handle.join().map_err(|_| Error::ThreadPanicked(name))?
}
