mod authority_worker;
pub use authority_worker::{AuthorityHandle, AuthorityWorker};
