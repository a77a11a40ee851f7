// src/socket/patterns/mod.rs

//! Reusable building blocks shared by the socket pattern implementations.

pub mod fair_queue;
pub mod load_balancer;
pub mod router;

pub(crate) use fair_queue::FairQueue;
pub(crate) use load_balancer::LoadBalancer;
pub(crate) use router::RouterMap;
