//! Ports - 抽象化レイヤー
//!
//! 外部システム（CI サービスの REST API）へのインターフェース。
//! lister / deleter は port にだけ依存し、実装は `impls` に置く。

pub mod artifact_api;

pub use self::artifact_api::ArtifactApi;
