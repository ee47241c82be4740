//! Native capture window for calibration.
//!
//! The window is a plain top-level `EDIT` control.  It is created on the
//! calibration thread and must only be touched from that thread: `settle`
//! pumps that thread's message queue so the injected keystrokes are
//! translated into `WM_CHAR` and land in the control.

#![cfg(target_os = "windows")]

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use windows::core::w;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::SetFocus;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, DispatchMessageW, GetWindowTextLengthW, GetWindowTextW,
    PeekMessageW, SetForegroundWindow, SetWindowTextW, ShowWindow, TranslateMessage, MSG,
    PM_REMOVE, SW_SHOW, WS_EX_TOPMOST, WS_OVERLAPPEDWINDOW, WS_VISIBLE,
};

use crate::application::calibrate_keyboard::{CaptureError, CaptureSurface};

const PUMP_INTERVAL: Duration = Duration::from_millis(5);

/// A focused `EDIT` window that calibration types into.
#[derive(Default)]
pub struct EditCaptureWindow {
    hwnd: Option<HWND>,
}

impl EditCaptureWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn pump_messages() {
        let mut msg = MSG::default();
        // SAFETY: msg is a valid MSG on the stack; None reads this thread's queue
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

impl CaptureSurface for EditCaptureWindow {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        // SAFETY: all pointers are static wide strings or null; the returned
        // handle is owned by this struct and destroyed in `close`.
        let hwnd = unsafe {
            let instance = GetModuleHandleW(None).map_err(|e| CaptureError::Open(e.to_string()))?;
            CreateWindowExW(
                WS_EX_TOPMOST,
                w!("EDIT"),
                w!("Virtual Keyboard calibration"),
                WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                200,
                200,
                420,
                90,
                None,
                None,
                instance,
                None,
            )
            .map_err(|e| CaptureError::Open(e.to_string()))?
        };

        // SAFETY: hwnd was just created on this thread
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            if !SetForegroundWindow(hwnd).as_bool() {
                warn!("capture window could not take the foreground");
            }
            let _ = SetFocus(hwnd);
        }
        debug!("capture window opened");
        self.hwnd = Some(hwnd);
        Ok(())
    }

    fn clear(&mut self) {
        if let Some(hwnd) = self.hwnd {
            // SAFETY: hwnd is a live window owned by this thread
            if let Err(e) = unsafe { SetWindowTextW(hwnd, w!("")) } {
                warn!("could not clear capture window: {e}");
            }
        }
    }

    fn read(&mut self) -> String {
        let Some(hwnd) = self.hwnd else {
            return String::new();
        };
        // SAFETY: hwnd is a live window; the buffer is sized from the
        // reported length plus the terminator.
        unsafe {
            let len = GetWindowTextLengthW(hwnd).max(0) as usize;
            let mut buf = vec![0u16; len + 1];
            let copied = GetWindowTextW(hwnd, &mut buf).max(0) as usize;
            String::from_utf16_lossy(&buf[..copied])
        }
    }

    fn settle(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            Self::pump_messages();
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(PUMP_INTERVAL.min(deadline - now));
        }
    }

    fn close(&mut self) {
        if let Some(hwnd) = self.hwnd.take() {
            // SAFETY: hwnd is a live window owned by this thread
            if let Err(e) = unsafe { DestroyWindow(hwnd) } {
                warn!("could not destroy capture window: {e}");
            }
            Self::pump_messages();
            debug!("capture window closed");
        }
    }
}

impl Drop for EditCaptureWindow {
    fn drop(&mut self) {
        self.close();
    }
}
