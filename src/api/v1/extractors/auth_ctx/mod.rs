/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 * - SecurityContext
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::{AuthCtx, SecurityContext};
