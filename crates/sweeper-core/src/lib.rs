//! sweeper-core
//!
//! Core building blocks for purging CI build artifacts.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, artifact, outcome, state, errors）
//! - **ports**: 抽象化レイヤー（ArtifactApi）
//! - **impls**: 実装（GithubClient, InMemoryArtifactApi）
//! - **app**: アプリケーションロジック（ArtifactLister, BoundedDeleter, Purger）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{ArtifactLister, BoundedDeleter, Purger};
pub use config::Config;
pub use error::SweeperError;
