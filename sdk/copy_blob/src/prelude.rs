pub use crate::{
    copy_blob, AzureCopyBackend, BlobLocator, CopyBackend, CopyBlobParams, CopyOutcome,
    CopyProgress, CopyRequest, CopyState,
};
