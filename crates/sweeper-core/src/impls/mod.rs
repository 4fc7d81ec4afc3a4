//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **GithubClient**: GitHub REST API（本番用）
//! - **InMemoryArtifactApi**: 開発・テスト用

pub mod github;
pub mod inmem_api;

pub use self::github::GithubClient;
pub use self::inmem_api::InMemoryArtifactApi;
