//! # Application Module
//!
//! Dispatcher, handlers, connection loops and the outputs they publish to.

pub mod dispatcher;
mod handlers;
pub mod outputs;
pub mod pipeline;
pub mod secondary;

pub use dispatcher::{Flow, MessageDispatcher};
pub use outputs::{BestEffortSender, DropPolicy, FanOut, OutputChannels, OutputReceivers};
pub use pipeline::{
    connect_and_run, on_connect, on_disconnect, run_connection, spawn_connection, Connection,
    DisconnectReason,
};
pub use secondary::fetch_smart_contract_state;
