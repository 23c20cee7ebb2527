//! HTTP clients of the two upstream services, built on a [`crate::transport::Transport`].

pub mod openai;
pub mod seobility;
