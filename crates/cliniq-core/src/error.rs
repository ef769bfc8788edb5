// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use cliniq_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsultError {
    #[error("a response is still streaming")]
    Busy,

    #[error("nothing to send: message is empty and has no attachment")]
    EmptyInput,

    #[error("failed to initialize the responder: {0}")]
    ResponderInit(String),

    #[error("responder error: {0}")]
    Responder(String),

    #[error("a note needs at least one completed exchange")]
    NotEnoughContext,

    #[error("note generation failed: {0}")]
    NoteFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
