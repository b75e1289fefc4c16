/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module は `apply(router, ...)` を公開する
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
