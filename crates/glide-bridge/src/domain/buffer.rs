//! Boundary-safe argument buffers.
//!
//! Arguments are copied once into a single contiguous allocation, together
//! with a C-layout descriptor array pointing into it. Neither allocation is
//! touched after construction, so every pointer stays valid for as long as
//! the buffer is alive. The dispatcher keeps the buffer alive for the
//! duration of `submit`, and the pending operation keeps it alive until
//! completion when the engine reads arguments asynchronously.

#![allow(unsafe_code)]

use std::fmt;

/// How long the engine needs argument memory after `submit` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgumentRetention {
    /// Engine copies what it needs before `submit` returns.
    #[default]
    CopiedOnSubmit,
    /// Engine may read the buffer until it signals completion.
    UntilCompletion,
}

/// One argument as seen by C code.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiArg {
    pub ptr: *const u8,
    pub len: usize,
}

/// Marshaled, ordered list of byte-string arguments.
pub struct ArgumentBuffer {
    data: Box<[u8]>,
    descriptors: Box<[FfiArg]>,
}

// SAFETY: descriptors only point into `data`, which is owned, never mutated
// and never reallocated after construction. Sharing read-only views across
// threads is therefore sound.
unsafe impl Send for ArgumentBuffer {}
unsafe impl Sync for ArgumentBuffer {}

impl ArgumentBuffer {
    /// Copy `args` into boundary-safe form, preserving order.
    pub fn marshal<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        let mut data = Vec::new();
        let mut bounds = Vec::new();
        for arg in args {
            let arg = arg.as_ref();
            bounds.push((data.len(), arg.len()));
            data.extend_from_slice(arg);
        }

        let data = data.into_boxed_slice();
        let base = data.as_ptr();
        let descriptors = bounds
            .into_iter()
            .map(|(offset, len)| FfiArg {
                // offset <= data.len(), so this stays in bounds (or one past the end for empty args)
                ptr: base.wrapping_add(offset),
                len,
            })
            .collect();

        Self { data, descriptors }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Total payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.descriptors.get(index).map(|d| self.slice(d))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.descriptors.iter().map(|d| self.slice(d))
    }

    /// Descriptor array for the native call. Valid while `self` is alive.
    pub fn as_ffi(&self) -> &[FfiArg] {
        &self.descriptors
    }

    fn slice(&self, descriptor: &FfiArg) -> &[u8] {
        let offset = descriptor.ptr as usize - self.data.as_ptr() as usize;
        &self.data[offset..offset + descriptor.len]
    }
}

impl fmt::Debug for ArgumentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentBuffer")
            .field("args", &self.len())
            .field("bytes", &self.byte_len())
            .finish()
    }
}
