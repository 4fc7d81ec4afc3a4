//! App - アプリケーション層
//!
//! ports を組み合わせて削除パイプラインを実装する。
//!
//! # 主要コンポーネント
//! - **ArtifactLister**: ページングで全件取得
//! - **BoundedDeleter**: 同時実行数を制限した一括削除
//! - **Purger**: 上の 2 つをつなぐパイプライン

pub mod deleter;
pub mod lister;
pub mod purger;

pub use self::deleter::BoundedDeleter;
pub use self::lister::ArtifactLister;
pub use self::purger::Purger;
