//! Stack Scanning - Concurrent Thread Stack Scanning
//!
//! Module ini mengimplementasikan concurrent stack scanning.
//! Tantangan: saat concurrent marking, thread mutator sedang running
//! dan stack berubah terus.
//!
//! Solution: Concurrent Thread Stack Scanning (CTSS)
//! 1. STW brief untuk setup watermark
//! 2. Mark bagian stack yang tidak berubah
//! 3. Concurrent scanning untuk marked frames
//! 4. Handle frames yang berubah dengan barrier

use crate::error::Result;

/// StackScanner - scanner untuk concurrent stack scanning
///
/// Mengelola concurrent scanning dari thread stacks.
pub struct StackScanner {
    /// Watermark untuk setiap thread
    watermarks: std::sync::Mutex<std::collections::HashMap<u64, StackWatermark>>,

    /// Scanned frames
    scanned_frames: std::sync::Mutex<Vec<usize>>,
}

impl StackScanner {
    /// Create new stack scanner
    pub fn new() -> Self {
        Self {
            watermarks: std::sync::Mutex::new(std::collections::HashMap::new()),
            scanned_frames: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Setup watermark untuk thread
    ///
    /// Dipanggil saat Pause Mark Start (STW).
    /// Mark bagian stack yang tidak akan berubah.
    pub fn setup_watermark(&self, thread_id: u64, stack_pointer: usize) -> Result<()> {
        let watermark = StackWatermark {
            thread_id,
            stack_pointer,
            timestamp: std::time::Instant::now(),
        };

        self.watermarks.lock().unwrap().insert(thread_id, watermark);

        Ok(())
    }

    /// Scan stack di bawah watermark
    ///
    /// Scan bagian stack yang sudah di-mark (di bawah watermark).
    pub fn scan_below_watermark(&self, thread_id: u64) -> Result<Vec<usize>> {
        let watermarks = self.watermarks.lock().unwrap();

        if let Some(watermark) = watermarks.get(&thread_id) {
            // Scan stack dari base sampai watermark
            // Note: Dalam implementasi nyata, ini walk stack frames
            // di bawah watermark pointer

            let mut pointers = Vec::new();

            // Dummy implementation
            let mut addr = watermark.stack_pointer;
            while addr > watermark.stack_pointer - 0x1000 {
                pointers.push(addr);
                addr -= 64;
            }

            // Track scanned frames
            self.scanned_frames.lock().unwrap().extend(&pointers);

            return Ok(pointers);
        }

        Ok(Vec::new())
    }

    /// Handle stack frame yang berubah
    ///
    /// Dipanggil saat thread push/pop frame.
    pub fn handle_frame_change(&self, thread_id: u64, frame_address: usize) {
        // Check jika frame di-scan
        let scanned = self.scanned_frames.lock().unwrap();
        if scanned.contains(&frame_address) {
            // Frame sudah di-scan, perlu re-scan
            // Note: Dalam implementasi nyata, ini enqueue frame
            // untuk re-scanning
        }
    }

    /// Clear scanner untuk GC cycle baru
    pub fn clear(&self) {
        self.watermarks.lock().unwrap().clear();
        self.scanned_frames.lock().unwrap().clear();
    }

    /// Get watermark untuk thread
    pub fn get_watermark(&self, thread_id: u64) -> Option<StackWatermark> {
        self.watermarks.lock().unwrap().get(&thread_id).copied()
    }
}

impl Default for StackScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack watermark - marker untuk concurrent scanning
///
/// Menandai bagian stack yang sudah di-scan.
#[derive(Debug, Clone, Copy)]
pub struct StackWatermark {
    /// Thread ID
    pub thread_id: u64,
    /// Stack pointer saat watermark di-set
    pub stack_pointer: usize,
    /// Timestamp watermark di-set
    pub timestamp: std::time::Instant,
}

/// Frame iterator untuk stack walking
pub struct FrameIterator {
    /// Current frame
    current: usize,
    /// End frame
    end: usize,
}

impl FrameIterator {
    /// Create new frame iterator
    pub fn new(start: usize, end: usize) -> Self {
        Self { current: start, end }
    }
}

impl Iterator for FrameIterator {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.end {
            let frame = self.current;
            self.current += 64; // Dummy frame size
            Some(frame)
        } else {
            None
        }
    }
}

/// Scan stack range untuk pointers
///
/// Helper function untuk scan contiguous stack range.
pub fn scan_stack_range(start: usize, end: usize) -> Vec<usize> {
    let mut pointers = Vec::new();

    // Scan word by word
    let mut addr = start;
    while addr < end {
        // Check jika word adalah valid pointer
        // Note: Dalam implementasi nyata, ini check apakah
        // value adalah valid pointer ke heap

        // Dummy: assume semua values adalah pointers
        pointers.push(unsafe { *(addr as *const usize) });

        addr += 8; // 8 bytes per word
    }

    pointers
}
