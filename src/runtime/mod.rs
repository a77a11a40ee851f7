// src/runtime/mod.rs

//! Core asynchronous primitives shared by sockets: the pipe message envelope
//! and the channel types that carry it between connected peers.

pub(crate) mod pipe;

pub(crate) use pipe::{pipe_credit, InboundMsg, PipeCredit, PipeSender, PipeWriter};
