//! COM apartment for the thread that drives the runtime
//!
//! The Windows runtime library resolves WinRT types through COM and expects
//! the calling thread to already be in the multithreaded apartment. It never
//! joins one itself. On other platforms the guard does nothing.

use crate::utils::errors::HostResult;
use std::marker::PhantomData;

/// Keeps the current thread in a COM apartment until dropped.
///
/// Create it before [`RuntimeHandle`](super::RuntimeHandle) and declare it
/// first, so the handle (and `runtime_deinit`) is dropped before
/// `CoUninitialize` runs.
#[derive(Debug)]
pub struct ComApartment {
    /// Whether `CoUninitialize` is owed on drop
    joined: bool,
    _not_send: PhantomData<*const ()>,
}

#[cfg(windows)]
impl ComApartment {
    /// `CoInitializeEx(None, COINIT_MULTITHREADED)`.
    ///
    /// `S_FALSE` (already in the MTA) still needs a balancing
    /// `CoUninitialize`. `RPC_E_CHANGED_MODE` means the thread already
    /// lives in a single-threaded apartment; the runtime still gets an
    /// apartment, so this is logged and nothing is owed.
    pub fn enter() -> HostResult<Self> {
        use crate::utils::errors::HostError;
        use tracing::{debug, warn};
        use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
        use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

        // SAFETY: no reserved pointer; balanced by `CoUninitialize` in `Drop`.
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };

        if hr == RPC_E_CHANGED_MODE {
            warn!("Thread is already in a single-threaded COM apartment");
            return Ok(Self::detached());
        }
        if hr.is_err() {
            return Err(HostError::ComApartment(hr.0));
        }

        debug!("Joined multithreaded COM apartment ({:#010x})", hr.0);
        Ok(Self {
            joined: true,
            _not_send: PhantomData,
        })
    }
}

#[cfg(not(windows))]
impl ComApartment {
    /// No COM outside Windows
    pub fn enter() -> HostResult<Self> {
        Ok(Self::detached())
    }
}

impl ComApartment {
    fn detached() -> Self {
        Self {
            joined: false,
            _not_send: PhantomData,
        }
    }

    /// Whether this guard will leave the apartment on drop
    pub fn is_joined(&self) -> bool {
        self.joined
    }
}

#[cfg(windows)]
impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.joined {
            // SAFETY: paired with the successful `CoInitializeEx` in `enter`,
            // on the same thread (the guard is not `Send`).
            unsafe { windows::Win32::System::Com::CoUninitialize() };
            tracing::debug!("Left COM apartment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_leave() {
        let apartment = ComApartment::enter().unwrap();
        if cfg!(windows) {
            assert!(apartment.is_joined());
        } else {
            assert!(!apartment.is_joined());
        }
        drop(apartment);
    }

    #[cfg(windows)]
    #[test]
    fn test_apartment_is_multithreaded_until_dropped() {
        use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
        use windows::Win32::System::Com::{
            CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED,
        };

        std::thread::spawn(|| {
            let outer = ComApartment::enter().unwrap();
            let nested = ComApartment::enter().unwrap();
            assert!(nested.is_joined());

            // Switching to STA is refused while the MTA guard is held.
            let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
            assert_eq!(hr, RPC_E_CHANGED_MODE);

            drop(nested);
            drop(outer);

            // Fully left: the thread may now pick a different apartment.
            let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
            assert!(hr.is_ok());
            unsafe { CoUninitialize() };
        })
        .join()
        .unwrap();
    }
}
