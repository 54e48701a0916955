//! Catalog 图片指标

use metrics::{counter, histogram};
use std::time::Instant;

use crate::domain::value_objects::OwnerKind;

// ============================================================================
// 图片关联 Metrics
// ============================================================================

/// 记录新挂载的图片关联数
pub fn record_images_attached(kind: OwnerKind, count: u64) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!("catalog_images_attached_total", &labels).increment(count);
}

/// 记录解除的图片关联数
pub fn record_images_detached(kind: OwnerKind, count: u64) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!("catalog_images_detached_total", &labels).increment(count);
}

/// 记录因达到上限而被拒绝的 owner 数
pub fn record_image_limit_rejections(kind: OwnerKind, count: u64) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!("catalog_image_limit_rejections_total", &labels).increment(count);
}

/// 记录批量操作请求的 owner 数
pub fn record_batch_owners(kind: OwnerKind, operation: &str, owners: usize) {
    let labels = [
        ("kind", kind.as_str().to_string()),
        ("operation", operation.to_string()),
    ];
    histogram!("catalog_image_batch_owners", &labels).record(owners as f64);
}

// ============================================================================
// 操作耗时 Metrics
// ============================================================================

/// 图片操作计时器
pub struct OperationTimer {
    start: Instant,
    kind: OwnerKind,
    operation: &'static str,
}

impl OperationTimer {
    pub fn new(kind: OwnerKind, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            kind,
            operation,
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64() * 1000.0;
        let labels = [
            ("kind", self.kind.as_str().to_string()),
            ("operation", self.operation.to_string()),
            ("success", success.to_string()),
        ];

        histogram!("catalog_image_operation_duration_ms", &labels).record(duration);
        counter!("catalog_image_operations_total", &labels).increment(1);
    }
}
