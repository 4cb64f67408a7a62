// Runtime binding to the native controller shim.
use super::{NativeShim, ShimControllerState, ShimError, ShimLoader};
use std::ffi::{c_void, CStr, CString};
use tracing::{debug, info};

type ReadStateFn = unsafe extern "C" fn(out_state: *mut ShimControllerState) -> i32;
type LifecycleFn = unsafe extern "C" fn();

const READ_STATE_SYMBOL: &CStr = c"gvr_controller_read_state";
const PAUSE_SYMBOL: &CStr = c"gvr_controller_pause";
const RESUME_SYMBOL: &CStr = c"gvr_controller_resume";

/// Loads the shim with `dlopen` and resolves its entry points
#[derive(Debug, Clone)]
pub struct DynamicShimLoader {
    library: String,
}

impl DynamicShimLoader {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
        }
    }
}

impl ShimLoader for DynamicShimLoader {
    fn load(&self) -> Result<Box<dyn NativeShim>, ShimError> {
        let name = CString::new(self.library.as_str())
            .map_err(|e| ShimError::LibraryNotFound(e.to_string()))?;

        // SAFETY: `name` is a valid NUL-terminated string for the whole call.
        let handle = unsafe { libc::dlopen(name.as_ptr(), libc::RTLD_NOW) };
        if handle.is_null() {
            return Err(ShimError::LibraryNotFound(format!(
                "{}: {}",
                self.library,
                last_dl_error()
            )));
        }

        // SAFETY: handle came from a successful dlopen and stays open until
        // it is either closed below or owned by the returned DynamicShim.
        let symbols = unsafe { resolve_symbols(handle) };
        match symbols {
            Ok((read_state, pause, resume)) => {
                info!("Loaded native controller shim from {}", self.library);
                Ok(Box::new(DynamicShim {
                    handle,
                    read_state,
                    pause,
                    resume,
                }))
            }
            Err(e) => {
                // SAFETY: handle came from a successful dlopen and is not used afterwards.
                unsafe { libc::dlclose(handle) };
                Err(e)
            }
        }
    }
}

unsafe fn resolve_symbols(
    handle: *mut c_void,
) -> Result<(ReadStateFn, LifecycleFn, LifecycleFn), ShimError> {
    let read_state = resolve(handle, READ_STATE_SYMBOL)?;
    let pause = resolve(handle, PAUSE_SYMBOL)?;
    let resume = resolve(handle, RESUME_SYMBOL)?;
    Ok((
        std::mem::transmute::<*mut c_void, ReadStateFn>(read_state),
        std::mem::transmute::<*mut c_void, LifecycleFn>(pause),
        std::mem::transmute::<*mut c_void, LifecycleFn>(resume),
    ))
}

unsafe fn resolve(handle: *mut c_void, symbol: &CStr) -> Result<*mut c_void, ShimError> {
    let ptr = libc::dlsym(handle, symbol.as_ptr());
    if ptr.is_null() {
        Err(ShimError::MissingSymbol(symbol.to_string_lossy().into_owned()))
    } else {
        Ok(ptr)
    }
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns either NULL or a valid C string owned by libc.
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "unknown dlopen error".to_string()
    } else {
        // SAFETY: non-null, so it points to libc's NUL-terminated message.
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}

struct DynamicShim {
    handle: *mut c_void,
    read_state: ReadStateFn,
    pause: LifecycleFn,
    resume: LifecycleFn,
}

// The shim entry points are callable from any thread; the handle is only
// touched again in Drop.
unsafe impl Send for DynamicShim {}

impl NativeShim for DynamicShim {
    fn read_state(&mut self, out: &mut ShimControllerState) -> Result<(), ShimError> {
        // SAFETY: the symbol was resolved from the still-open library and
        // `out` is a valid, exclusive pointer to a repr(C) struct.
        let code = unsafe { (self.read_state)(out) };
        if code == 0 {
            Ok(())
        } else {
            Err(ShimError::CallFailed(code))
        }
    }

    fn pause(&mut self) {
        // SAFETY: resolved from the still-open library, takes no arguments.
        unsafe { (self.pause)() }
    }

    fn resume(&mut self) {
        // SAFETY: resolved from the still-open library, takes no arguments.
        unsafe { (self.resume)() }
    }
}

impl Drop for DynamicShim {
    fn drop(&mut self) {
        debug!("Unloading native controller shim");
        // SAFETY: handle came from dlopen, is closed exactly once here and
        // the entry points are not called after drop.
        unsafe { libc::dlclose(self.handle) };
    }
}
