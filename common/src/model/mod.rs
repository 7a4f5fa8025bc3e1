pub mod certificate;
pub mod conditional;

pub use certificate::Certificate;
pub use conditional::Conditional;
