// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Formatting of the client's own diagnostics.
//!
//! The client reports flushes, dropped batches and handshake results through
//! `tracing`. Hosts that already install a subscriber get those events in
//! their own format; hosts that do not can call [`init`].
//!
//! Every line carries the level and, for events raised inside this crate, the
//! subsystem that raised them (the last segment of the module path):
//!
//! ```text
//! SENINTEL | INFO | HANDSHAKE | Logs will be written to: /srv/app/logs/SenIntel.json
//! SENINTEL | ERROR | FLUSHER | Dropped 10 entries, delivery to collector http://c/log failed: ...
//! ```

use crate::error::ConfigError;
use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Event formatter producing
/// `SENINTEL | LEVEL | SUBSYSTEM | span{fields}: message fields`.
///
/// Events from other crates (the host application, reqwest) have no
/// subsystem tag.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

/// Tag for events raised by this crate: `senintel::sink::remote` is `REMOTE`.
fn subsystem(target: &str) -> Option<String> {
    let module = target.strip_prefix(concat!(env!("CARGO_CRATE_NAME"), "::"))?;
    module.rsplit("::").next().map(str::to_uppercase)
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "SENINTEL | {} | ", metadata.level())?;
        if let Some(tag) = subsystem(metadata.target()) {
            write!(&mut writer, "{tag} | ")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Builds the filter for `level`, silencing the HTTP stack's own chatter.
pub fn env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    let directives = format!("h2=off,hyper=off,rustls=off,{}", level.to_lowercase());
    EnvFilter::try_new(directives).map_err(|e| ConfigError::InvalidSetting {
        name: "log_level",
        reason: e.to_string(),
    })
}

/// Installs a global subscriber printing the client's diagnostics at `level`.
///
/// Fails if `level` is not a valid filter or a global subscriber is already set.
pub fn init(level: &str) -> Result<(), ConfigError> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter(level)?)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        ConfigError::InvalidSetting {
            name: "log_level",
            reason: e.to_string(),
        }
    })
}
