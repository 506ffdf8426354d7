//! Camera state machine and the owned media stream.
//!
//! [`CameraState`] is plain data the flow engine can test without a browser.
//! [`CameraStream`] is the live resource: it exists only while a step owns
//! the camera, and dropping it stops every track.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use crate::surface::VideoSource;
use crate::viewport::CanvasSize;

/// Status line shown before the user asks for the camera.
pub const STATUS_OFF: &str = "Click \"Start Camera\" to begin";
pub const STATUS_PENDING: &str = "Starting camera...";
pub const STATUS_ACTIVE: &str = "Camera active - adjust circle to match your bowl";
pub const STATUS_DENIED: &str = "Camera access denied. Please enable camera permissions.";
pub const STATUS_UNAVAILABLE: &str = "No camera available on this device.";

/// `HTMLMediaElement.HAVE_METADATA`
const HAVE_METADATA: u16 = 1;

const LOADED_METADATA: &str = "loadedmetadata";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// A stream is already pending or live.
    #[error("camera already acquired")]
    AlreadyAcquired,
    /// No media devices, no matching camera, or the device is busy.
    #[error("camera unavailable")]
    Unavailable,
    /// The user or the page policy refused access.
    #[error("camera access denied: {0}")]
    Denied(String),
    /// The operation needs a pending or live camera and there is none.
    #[error("camera is not active")]
    NotActive,
    /// The camera is only started from the calibration step.
    #[error("camera can only be started while calibrating")]
    NotCalibrating,
}

impl CameraError {
    /// Classify a `getUserMedia` rejection by its `DOMException` name.
    #[must_use]
    pub fn from_dom(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => Self::Denied(message.to_owned()),
            _ => Self::Unavailable,
        }
    }

    fn from_js(err: &JsValue) -> Self {
        match err.dyn_ref::<DomException>() {
            Some(dom) => Self::from_dom(&dom.name(), &dom.message()),
            None => Self::Unavailable,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Denied(_) => STATUS_DENIED,
            Self::Unavailable => STATUS_UNAVAILABLE,
            Self::AlreadyAcquired => STATUS_PENDING,
            Self::NotActive | Self::NotCalibrating => STATUS_OFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CameraState {
    #[default]
    Off,
    /// `getUserMedia` is in flight. There is no timeout.
    Pending,
    Active {
        width: f64,
        height: f64,
    },
    Failed(CameraError),
}

impl CameraState {
    #[must_use]
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Off => STATUS_OFF,
            Self::Pending => STATUS_PENDING,
            Self::Active { .. } => STATUS_ACTIVE,
            Self::Failed(err) => err.user_message(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    #[must_use]
    pub fn frame_size(&self) -> Option<CanvasSize> {
        match *self {
            Self::Active { width, height } => Some(CanvasSize::new(width, height)),
            _ => None,
        }
    }

    /// Move to `Pending`. A failed attempt may be retried.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::AlreadyAcquired`] while pending or active.
    pub fn begin(&mut self) -> Result<(), CameraError> {
        match self {
            Self::Pending | Self::Active { .. } => Err(CameraError::AlreadyAcquired),
            Self::Off | Self::Failed(_) => {
                *self = Self::Pending;
                Ok(())
            }
        }
    }

    /// Complete a pending acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::NotActive`] if nothing was pending, e.g. the
    /// session was reset while the permission prompt was open.
    pub fn activate(&mut self, size: CanvasSize) -> Result<(), CameraError> {
        if *self != Self::Pending {
            return Err(CameraError::NotActive);
        }
        *self = Self::Active { width: size.width, height: size.height };
        Ok(())
    }

    /// Record a failed acquisition. Ignored unless pending.
    pub fn fail(&mut self, err: CameraError) -> bool {
        if *self == Self::Pending {
            *self = Self::Failed(err);
            true
        } else {
            false
        }
    }

    pub fn release(&mut self) {
        *self = Self::Off;
    }
}

// =============================================================
// Live stream
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct Ideal {
    ideal: u32,
}

/// Video track constraints: rear camera, 720p preferred.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    facing_mode: &'static str,
    width: Ideal,
    height: Ideal,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self { facing_mode: "environment", width: Ideal { ideal: 1280 }, height: Ideal { ideal: 720 } }
    }
}

impl VideoConstraints {
    fn to_js(&self) -> Result<JsValue, JsValue> {
        let json = serde_json::to_string(self).map_err(|e| JsValue::from_str(&e.to_string()))?;
        js_sys::JSON::parse(&json)
    }
}

/// A live camera stream bound to a `<video>` element.
pub struct CameraStream {
    stream: MediaStream,
    video: HtmlVideoElement,
}

impl CameraStream {
    /// Ask for the camera, attach it to `video`, and wait until frames have a size.
    ///
    /// `still_wanted` is checked once the browser grants a stream; if the
    /// request has been abandoned meanwhile, the stream is stopped without
    /// ever touching `video`.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::Denied`] when the user refuses,
    /// [`CameraError::NotActive`] when the request was abandoned, and
    /// [`CameraError::Unavailable`] for every other failure.
    pub async fn acquire(video: HtmlVideoElement, still_wanted: impl Fn() -> bool) -> Result<Self, CameraError> {
        let stream = request_stream().await.map_err(|err| {
            log::warn!("getUserMedia failed: {err:?}");
            CameraError::from_js(&err)
        })?;

        // From here on, Drop stops the tracks if anything below fails.
        let camera = Self { stream, video };
        if !still_wanted() {
            return Err(CameraError::NotActive);
        }
        camera.video.set_src_object(Some(&camera.stream));
        camera.wait_for_metadata().await.map_err(|err| {
            log::warn!("camera metadata never arrived: {err:?}");
            CameraError::Unavailable
        })?;
        if let Err(err) = camera.play().await {
            log::warn!("video play() rejected: {err:?}");
        }

        log::info!("camera acquired");
        Ok(camera)
    }

    #[must_use]
    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Whether `video` is currently showing this stream.
    fn is_attached(&self) -> bool {
        self.video
            .src_object()
            .is_some_and(|current| AsRef::<JsValue>::as_ref(&current) == AsRef::<JsValue>::as_ref(&self.stream))
    }

    async fn wait_for_metadata(&self) -> Result<(), JsValue> {
        if self.video.ready_state() >= HAVE_METADATA {
            return Ok(());
        }
        // Overlapping acquisitions share `video`; each keeps its own listener.
        let mut listener: Option<js_sys::Function> = None;
        let mut refused: Option<JsValue> = None;
        let loaded = js_sys::Promise::new(&mut |resolve, _reject| {
            match self.video.add_event_listener_with_callback(LOADED_METADATA, &resolve) {
                Ok(()) => listener = Some(resolve),
                Err(err) => refused = Some(err),
            }
        });
        if let Some(err) = refused {
            return Err(err);
        }
        let waited = JsFuture::from(loaded).await;
        if let Some(listener) = listener {
            self.video.remove_event_listener_with_callback(LOADED_METADATA, &listener)?;
        }
        waited.map(|_| ())
    }

    async fn play(&self) -> Result<(), JsValue> {
        JsFuture::from(self.video.play()?).await?;
        Ok(())
    }
}

impl VideoSource for CameraStream {
    fn frame_size(&self) -> Option<CanvasSize> {
        self.video.frame_size()
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        if self.is_attached() {
            self.video.set_src_object(None);
        }
        log::info!("camera released");
    }
}

async fn request_stream() -> Result<MediaStream, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let devices = window.navigator().media_devices()?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&VideoConstraints::default().to_js()?);
    constraints.set_audio(&JsValue::FALSE);

    let stream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?).await?;
    stream.dyn_into::<MediaStream>()
}
