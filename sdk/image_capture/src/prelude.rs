pub use crate::{
    capture_image, AzureComputeBackend, CaptureConfig, CaptureOutcome, CaptureParameters,
    CaptureParams, ComputeBackend, OperationState, ServicePrincipal, DEALLOCATE_POLL_INTERVAL,
};
