//! Windows raw-input mouse listener
//!
//! Creates a hidden window on a dedicated thread, registers for raw mouse
//! input with `RIDEV_INPUTSINK`, and forwards relative deltas plus button
//! transition flags from `WM_INPUT` into the SPSC ring. The window procedure
//! does no aggregation; it must stay off the OS event-delivery critical path.
//!
//! The listener context is handed to the window through `CreateWindowExW`'s
//! `lpParam` and stored in `GWLP_USERDATA` — no process-wide singleton.

use crate::capture::ring::MotionProducer;
use crate::capture::tracker::CaptureError;
use crate::capture::types::MotionEvent;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::ffi::c_void;
use std::mem::size_of;
use std::thread::JoinHandle;
use std::time::Duration;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::{
    GetRawInputData, RegisterRawInputDevices, HRAWINPUT, RAWINPUTDEVICE, RAWINPUTHEADER, RAWMOUSE,
    RIDEV_INPUTSINK, RIDEV_REMOVE, RID_INPUT, RIM_TYPEMOUSE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetWindowLongPtrW, PostThreadMessageW, RegisterClassExW, SetWindowLongPtrW, TranslateMessage,
    UnregisterClassW, CREATESTRUCTW, GWLP_USERDATA, MSG, WINDOW_EX_STYLE, WINDOW_STYLE,
    WM_CREATE, WM_INPUT, WM_QUIT, WNDCLASSEXW,
};

const WINDOW_CLASS: PCWSTR = w!("AimtraceRawInputWindow");
const WINDOW_NAME: PCWSTR = w!("aimtrace_raw_input");

/// Generic desktop controls page / mouse usage, per the HID usage tables.
const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;

/// Raw input packets larger than this are treated as malformed and skipped.
const MAX_RAW_EVENT_BYTES: u32 = 4096;

/// Bounded wait for the listener thread to report registration success.
const SPAWN_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-listener state owned by the message-loop thread and reachable from
/// the window procedure via `GWLP_USERDATA`.
struct ListenerCtx {
    producer: MotionProducer,
    wake: Sender<()>,
    /// Reusable raw-input read buffer to avoid per-event allocations.
    raw_buf: Vec<u8>,
}

impl ListenerCtx {
    fn handle_raw_input(&mut self, handle: HRAWINPUT) {
        let header_size = size_of::<RAWINPUTHEADER>() as u32;

        // Size query first; skip events we cannot size sanely.
        let mut size = 0u32;
        unsafe {
            GetRawInputData(handle, RID_INPUT, None, &mut size, header_size);
        }
        if size == 0 || size > MAX_RAW_EVENT_BYTES {
            return;
        }
        if self.raw_buf.len() < size as usize {
            self.raw_buf.resize(size as usize, 0);
        }
        let read = unsafe {
            GetRawInputData(
                handle,
                RID_INPUT,
                Some(self.raw_buf.as_mut_ptr() as *mut c_void),
                &mut size,
                header_size,
            )
        };
        if read == 0 || read == u32::MAX {
            return;
        }
        if (size as usize) < size_of::<RAWINPUTHEADER>() + size_of::<RAWMOUSE>() {
            return;
        }

        // The buffer is byte-aligned; read the header and the RAWMOUSE that
        // follows it unaligned.
        let header: RAWINPUTHEADER =
            unsafe { std::ptr::read_unaligned(self.raw_buf.as_ptr().cast()) };
        if header.dwType != RIM_TYPEMOUSE.0 {
            return;
        }
        let mouse: RAWMOUSE = unsafe {
            std::ptr::read_unaligned(self.raw_buf.as_ptr().add(size_of::<RAWINPUTHEADER>()).cast())
        };

        let button_flags = unsafe { mouse.Anonymous.Anonymous.usButtonFlags };
        let event = MotionEvent {
            dx: mouse.lLastX,
            dy: mouse.lLastY,
            button_flags,
        };
        if self.producer.push(event) {
            // Best-effort coalesced wake; a pending token already covers us.
            let _ = self.wake.try_send(());
        }
    }
}

unsafe extern "system" fn wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let create = lparam.0 as *const CREATESTRUCTW;
            if !create.is_null() {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, (*create).lpCreateParams as isize);
            }
            LRESULT(0)
        }
        WM_INPUT => {
            let ctx = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut ListenerCtx;
            if !ctx.is_null() {
                (*ctx).handle_raw_input(HRAWINPUT(lparam.0 as *mut c_void));
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Handle to the running raw-input listener thread.
pub struct CaptureListener {
    thread_id: u32,
    done_rx: Receiver<()>,
    join: Option<JoinHandle<()>>,
}

impl CaptureListener {
    /// Spawn the message-loop thread and block until raw-input registration
    /// succeeded or failed, so callers get a synchronous error.
    pub fn spawn(producer: MotionProducer, wake: Sender<()>) -> Result<Self, CaptureError> {
        let (ready_tx, ready_rx) = bounded::<Result<u32, CaptureError>>(1);
        let (done_tx, done_rx) = bounded::<()>(1);

        let join = std::thread::Builder::new()
            .name("mouse-capture".into())
            .spawn(move || {
                message_loop(producer, wake, ready_tx);
                let _ = done_tx.send(());
            })?;

        match ready_rx.recv_timeout(SPAWN_READY_TIMEOUT) {
            Ok(Ok(thread_id)) => {
                tracing::info!(thread_id, "raw input listener registered");
                Ok(Self {
                    thread_id,
                    done_rx,
                    join: Some(join),
                })
            }
            Ok(Err(err)) => {
                let _ = join.join();
                Err(err)
            }
            Err(_) => Err(CaptureError::Registration(
                "capture thread did not report readiness".into(),
            )),
        }
    }

    /// Post `WM_QUIT` to the message loop.
    pub fn request_quit(&self) {
        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    }

    /// Wait up to `timeout` for the thread to exit; returns `false` on
    /// timeout (the thread is left detached rather than blocking shutdown).
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            _ => {
                if let Some(join) = self.join.take() {
                    let _ = join.join();
                }
                true
            }
        }
    }
}

fn message_loop(
    producer: MotionProducer,
    wake: Sender<()>,
    ready_tx: Sender<Result<u32, CaptureError>>,
) {
    // Context lives on this stack frame for the whole loop; the window only
    // sees it through the GWLP_USERDATA pointer installed on WM_CREATE.
    let mut ctx = Box::new(ListenerCtx {
        producer,
        wake,
        raw_buf: Vec::new(),
    });

    let hinstance: HINSTANCE = match unsafe { GetModuleHandleW(None) } {
        Ok(module) => module.into(),
        Err(err) => {
            let _ = ready_tx.send(Err(CaptureError::Registration(err.to_string())));
            return;
        }
    };

    let class = WNDCLASSEXW {
        cbSize: size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(wndproc),
        hInstance: hinstance,
        lpszClassName: WINDOW_CLASS,
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        let _ = ready_tx.send(Err(CaptureError::Registration(
            windows::core::Error::from_win32().to_string(),
        )));
        return;
    }

    let hwnd = match unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WINDOW_CLASS,
            WINDOW_NAME,
            WINDOW_STYLE(0), // invisible
            0,
            0,
            0,
            0,
            None,
            None,
            hinstance,
            Some(&mut *ctx as *mut ListenerCtx as *const c_void),
        )
    } {
        Ok(hwnd) => hwnd,
        Err(err) => {
            unsafe {
                let _ = UnregisterClassW(WINDOW_CLASS, hinstance);
            }
            let _ = ready_tx.send(Err(CaptureError::Registration(err.to_string())));
            return;
        }
    };

    // Receive raw mouse input even while unfocused.
    let device = RAWINPUTDEVICE {
        usUsagePage: HID_USAGE_PAGE_GENERIC,
        usUsage: HID_USAGE_GENERIC_MOUSE,
        dwFlags: RIDEV_INPUTSINK,
        hwndTarget: hwnd,
    };
    if let Err(err) =
        unsafe { RegisterRawInputDevices(&[device], size_of::<RAWINPUTDEVICE>() as u32) }
    {
        unsafe {
            let _ = DestroyWindow(hwnd);
            let _ = UnregisterClassW(WINDOW_CLASS, hinstance);
        }
        let _ = ready_tx.send(Err(CaptureError::Registration(err.to_string())));
        return;
    }

    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready_tx.send(Ok(thread_id));

    let mut msg = MSG::default();
    loop {
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if result.0 <= 0 {
            // WM_QUIT or error
            break;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    // Unregister raw input, then tear down the window and class.
    let remove = RAWINPUTDEVICE {
        usUsagePage: HID_USAGE_PAGE_GENERIC,
        usUsage: HID_USAGE_GENERIC_MOUSE,
        dwFlags: RIDEV_REMOVE,
        hwndTarget: HWND::default(),
    };
    unsafe {
        let _ = RegisterRawInputDevices(&[remove], size_of::<RAWINPUTDEVICE>() as u32);
        let _ = DestroyWindow(hwnd);
        let _ = UnregisterClassW(WINDOW_CLASS, hinstance);
    }
    tracing::debug!("raw input listener exited");
}
