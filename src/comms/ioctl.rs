//! IOCTL transport to the PawnIO kernel driver.
//!
//! Thin RAII wrapper around the `\\.\PawnIO` device handle: opened with
//! `CreateFileW`, driven with `DeviceIoControl`, closed on drop.

use std::{
    ffi::{OsStr, c_void},
    io,
    os::windows::prelude::OsStrExt,
    ptr,
};
use windows_sys::Win32::{
    Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE},
    Storage::FileSystem::{CreateFileW, FILE_ATTRIBUTE_NORMAL, OPEN_EXISTING},
    System::IO::DeviceIoControl,
};

use super::driver::DriverTransport;
use crate::constants::{DRIVER_PATH, IOCTL_PAWNIO_EXECUTE, IOCTL_PAWNIO_LOAD_BINARY};

/// Build a NUL-terminated UTF-16 string for Win32 APIs.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}

pub struct PawnIo {
    handle: HANDLE,
}

impl PawnIo {
    /// Open the driver device. Fails when the driver is missing, the service
    /// is stopped or the process is not elevated.
    pub fn open() -> io::Result<Self> {
        let name = wide(DRIVER_PATH);
        let handle = unsafe {
            CreateFileW(
                name.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0,
                ptr::null(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle })
    }

    fn ioctl(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> io::Result<usize> {
        let mut returned: u32 = 0;
        let out_ptr = if output.is_empty() {
            ptr::null_mut()
        } else {
            output.as_mut_ptr() as *mut c_void
        };
        let ok = unsafe {
            DeviceIoControl(
                self.handle,
                code,
                input.as_ptr() as *const c_void,
                input.len() as u32,
                out_ptr,
                output.len() as u32,
                &mut returned,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(returned as usize)
    }
}

impl DriverTransport for PawnIo {
    fn load_binary(&mut self, blob: &[u8]) -> io::Result<()> {
        self.ioctl(IOCTL_PAWNIO_LOAD_BINARY, blob, &mut []).map(|_| ())
    }

    fn execute(&mut self, request: &[u8], reply: &mut [u8]) -> io::Result<usize> {
        self.ioctl(IOCTL_PAWNIO_EXECUTE, request, reply)
    }
}

impl Drop for PawnIo {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.handle) };
    }
}
