//! Primary/secondary backend selection with platform-default host-API
//! mapping (§4.D).
//!
//! [`select_backend`] tries the primary `cpal` backend first; if it cannot
//! be constructed, or the platform-preferred host API it reports is
//! unavailable, it falls back to the secondary `tinyaudio` backend and logs
//! the reason. The choice is memoized for the process lifetime via
//! [`std::sync::OnceLock`], since host enumeration is comparatively
//! expensive and backends don't appear/disappear within a run.

use std::sync::OnceLock;

use crate::adapter::{BackendAdapter, DeviceAdapter};
use crate::backend::AudioBackend;
use crate::config::HostApi;
use crate::cpal_backend::CpalBackend;
use crate::miniaudio_backend::MiniaudioBackend;

/// Which concrete backend [`select_backend`] chose, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedBackend {
    /// `cpal`.
    Primary,
    /// `tinyaudio`.
    Secondary,
}

static SELECTED: OnceLock<SelectedBackend> = OnceLock::new();

/// Map a preferred [`HostApi`] onto the platform's default stack. `Default`
/// defers entirely to `cpal`'s own host selection.
fn platform_default(host_api: HostApi) -> HostApi {
    if host_api != HostApi::Default {
        return host_api;
    }
    #[cfg(target_os = "windows")]
    return HostApi::Wasapi;
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    return HostApi::CoreAudio;
    #[cfg(target_os = "linux")]
    return HostApi::Alsa;
    #[cfg(target_os = "android")]
    return HostApi::AAudio;
    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "ios",
        target_os = "linux",
        target_os = "android"
    )))]
    return HostApi::Default;
}

/// Construct a boxed [`DeviceAdapter`], trying the primary backend before
/// falling back to the secondary one. The outcome is memoized per process.
pub fn select_backend(host_api: HostApi) -> Box<dyn DeviceAdapter> {
    let resolved = platform_default(host_api);
    let chosen = *SELECTED.get_or_init(|| probe(resolved));
    match chosen {
        SelectedBackend::Primary => Box::new(BackendAdapter::new(CpalBackend::new())),
        SelectedBackend::Secondary => Box::new(BackendAdapter::new(MiniaudioBackend::new())),
    }
}

fn probe(host_api: HostApi) -> SelectedBackend {
    let primary = CpalBackend::new();
    match primary.list_devices() {
        Ok(devices) if !devices.is_empty() => {
            tracing::info!(backend = "cpal", ?host_api, "selected primary audio backend");
            SelectedBackend::Primary
        }
        Ok(_) => {
            tracing::warn!("primary backend reports no devices, falling back to secondary");
            SelectedBackend::Secondary
        }
        Err(e) => {
            tracing::warn!(error = %e, "primary backend unavailable, falling back to secondary");
            SelectedBackend::Secondary
        }
    }
}

/// Last backend chosen by [`select_backend`] in this process, if any.
pub fn selected_backend() -> Option<SelectedBackend> {
    SELECTED.get().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_default_never_returns_default() {
        assert_ne!(platform_default(HostApi::Default), HostApi::Default);
    }

    #[test]
    fn explicit_host_api_passes_through() {
        assert_eq!(platform_default(HostApi::Jack), HostApi::Jack);
    }
}
