//! Scratch buffers for length-prefix staging.
//!
//! Composite encoding needs the content size before the header can be
//! written, so content is staged in a buffer first. Buffers are recycled
//! through a thread-local pool; [`Scratch`] returns its buffer on drop, on
//! every exit path.

use std::cell::RefCell;
use std::mem;
use std::ops::{Deref, DerefMut};

const POOL_ENTRIES: usize = 8;
const RETAIN_CAPACITY: usize = 1 << 16;

thread_local! {
    static POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

/// A pooled byte buffer with scoped acquisition.
#[doc(hidden)]
pub struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    pub fn acquire() -> Self {
        let buf = POOL.with(|pool| pool.borrow_mut().pop()).unwrap_or_default();
        Scratch { buf }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let mut buf = mem::take(&mut self.buf);
        if buf.capacity() > RETAIN_CAPACITY {
            return;
        }
        buf.clear();
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOL_ENTRIES {
                pool.push(buf);
            }
        });
    }
}

impl Deref for Scratch {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for Scratch {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}
