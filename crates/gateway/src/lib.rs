pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod live;
pub mod pipeline;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
