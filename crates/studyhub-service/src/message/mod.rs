mod service;

pub use service::MessageService;

#[cfg(test)]
pub(crate) use service::test_support;
