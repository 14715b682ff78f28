//! JIT Integration Hooks - ZGC-like JIT Communication
//!
//! Provides hooks for JIT compiler integration to optimize GC performance.
//! Similar to JVM's JIT compilation hooks for GC.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// JIT Compilation Events
#[derive(Debug, Clone)]
pub enum JitEvent {
    /// Method was JIT compiled
    Compiled {
        method_id: u64,
        code_size: usize,
        stack_size: usize,
    },

    /// Method was deoptimized
    Deoptimized { method_id: u64, reason: String },

    /// Method was unloaded
    Unloaded { method_id: u64 },

    /// Inline cache was updated
    InlineCacheUpdated {
        call_site_id: u64,
        new_target: Option<u64>,
    },
}

/// JIT Integration Interface
pub trait JitIntegration: Send + Sync {
    fn on_event(&self, event: JitEvent);
    fn get_roots(&self) -> Vec<JitRoot>;
}

/// JIT Root - root reference from JIT compiled code
#[derive(Debug, Clone)]
pub struct JitRoot {
    pub address: usize,
    pub root_type: JitRootType,
    pub method_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JitRootType {
    /// Oop (ordinary object pointer) field
    OopField,
    /// Method pointer
    Method,
    /// Inline cache
    InlineCache,
    /// Constant pool entry
    ConstantPool,
}

/// JIT GC Wrapper - handles JIT-GC interaction
pub struct JitGcInterface {
    /// JIT integration callbacks
    jit_integration: RwLock<Option<Arc<dyn JitIntegration>>>,

    /// JIT compiled methods
    compiled_methods: RwLock<Vec<CompiledMethod>>,

    /// GC safe point requests from JIT
    gc_requested: AtomicBool,

    /// Optimizations enabled
    optimizations_enabled: AtomicBool,

    /// Stats
    total_compilations: AtomicU64,
    total_deoptimizations: AtomicU64,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CompiledMethod {
    method_id: u64,
    code_start: usize,
    code_size: usize,
    stack_size: usize,
    has_oops: bool,
}

impl JitGcInterface {
    pub fn new() -> Self {
        Self {
            jit_integration: RwLock::new(None),
            compiled_methods: RwLock::new(Vec::new()),
            gc_requested: AtomicBool::new(false),
            optimizations_enabled: AtomicBool::new(true),
            total_compilations: AtomicU64::new(0),
            total_deoptimizations: AtomicU64::new(0),
        }
    }

    pub fn register_jit_integration(&self, integration: Arc<dyn JitIntegration>) {
        *self.jit_integration.write() = Some(integration);
    }

    pub fn notify_compiled(
        &self,
        method_id: u64,
        code_start: usize,
        code_size: usize,
        stack_size: usize,
        has_oops: bool,
    ) {
        self.total_compilations.fetch_add(1, Ordering::Relaxed);

        let method = CompiledMethod {
            method_id,
            code_start,
            code_size,
            stack_size,
            has_oops,
        };

        self.compiled_methods.write().push(method);

        if let Some(ref jit) = *self.jit_integration.read() {
            jit.on_event(JitEvent::Compiled {
                method_id,
                code_size,
                stack_size,
            });
        }
    }

    pub fn notify_deoptimized(&self, method_id: u64, reason: &str) {
        self.total_deoptimizations.fetch_add(1, Ordering::Relaxed);

        self.compiled_methods
            .write()
            .retain(|m| m.method_id != method_id);

        if let Some(ref jit) = *self.jit_integration.read() {
            jit.on_event(JitEvent::Deoptimized {
                method_id,
                reason: reason.to_string(),
            });
        }
    }

    pub fn request_gc(&self) {
        self.gc_requested.store(true, Ordering::Release);
    }

    pub fn check_gc_requested(&self) -> bool {
        self.gc_requested.load(Ordering::Acquire)
    }

    pub fn clear_gc_request(&self) {
        self.gc_requested.store(false, Ordering::Release);
    }

    pub fn get_jit_roots(&self) -> Vec<JitRoot> {
        let mut roots = Vec::new();

        for method in self.compiled_methods.read().iter() {
            if method.has_oops {
                roots.push(JitRoot {
                    address: method.code_start,
                    root_type: JitRootType::Method,
                    method_id: Some(method.method_id),
                });
            }
        }

        roots
    }

    pub fn enable_optimizations(&self) {
        self.optimizations_enabled.store(true, Ordering::Release);
    }

    pub fn disable_optimizations(&self) {
        self.optimizations_enabled.store(false, Ordering::Release);
    }

    pub fn is_optimizations_enabled(&self) -> bool {
        self.optimizations_enabled.load(Ordering::Acquire)
    }

    pub fn get_stats(&self) -> JitStats {
        JitStats {
            total_compilations: self.total_compilations.load(Ordering::Relaxed),
            total_deoptimizations: self.total_deoptimizations.load(Ordering::Relaxed),
            active_methods: self.compiled_methods.read().len(),
            gc_requested: self.gc_requested.load(Ordering::Relaxed),
        }
    }
}

impl Default for JitGcInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct JitStats {
    pub total_compilations: u64,
    pub total_deoptimizations: u64,
    pub active_methods: usize,
    pub gc_requested: bool,
}

/// No-op JIT integration for when no real JIT is present
pub struct NoopJitIntegration;

impl JitIntegration for NoopJitIntegration {
    fn on_event(&self, _event: JitEvent) {}
    fn get_roots(&self) -> Vec<JitRoot> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jit_gc_interface() {
        let interface = JitGcInterface::new();

        interface.notify_compiled(1, 0x1000, 4096, 256, true);
        interface.notify_compiled(2, 0x2000, 8192, 512, false);

        let stats = interface.get_stats();
        assert_eq!(stats.total_compilations, 2);
        assert_eq!(stats.active_methods, 2);

        let roots = interface.get_jit_roots();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_gc_request() {
        let interface = JitGcInterface::new();

        assert!(!interface.check_gc_requested());

        interface.request_gc();
        assert!(interface.check_gc_requested());

        interface.clear_gc_request();
        assert!(!interface.check_gc_requested());
    }
}
