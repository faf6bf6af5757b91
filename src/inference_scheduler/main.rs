use crate::cadence::Cadence;
use crate::config::SchedulerConfig;
use crate::downstream_action::interface::DownstreamAction;
use crate::frame_buffer::FrameBuffer;
use crate::image_classifier::interface::ImageClassifier;
use crate::inference_scheduler::stats::LatencyStats;
use crate::library::logger::interface::Logger;
use crate::result_store::interface::ResultStore;
use crate::shutdown::Shutdown;
use std::sync::Arc;

#[derive(Clone)]
pub struct InferenceScheduler {
    pub config: SchedulerConfig,
    pub logger: Arc<dyn Logger + Send + Sync>,
    pub frame_buffer: Arc<FrameBuffer>,
    pub cadence: Cadence,
    pub shutdown: Shutdown,
    pub image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    pub result_store: Arc<dyn ResultStore + Send + Sync>,
    pub downstream_action: Arc<dyn DownstreamAction + Send + Sync>,
    pub latency_stats: Arc<LatencyStats>,
}

impl InferenceScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        logger: Arc<dyn Logger + Send + Sync>,
        frame_buffer: Arc<FrameBuffer>,
        cadence: Cadence,
        shutdown: Shutdown,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        result_store: Arc<dyn ResultStore + Send + Sync>,
        downstream_action: Arc<dyn DownstreamAction + Send + Sync>,
        latency_stats: Arc<LatencyStats>,
    ) -> Self {
        Self {
            config,
            logger: logger.with_namespace("inference_scheduler"),
            frame_buffer,
            cadence,
            shutdown,
            image_classifier,
            result_store,
            downstream_action,
            latency_stats,
        }
    }
}
