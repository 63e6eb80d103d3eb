use thiserror::Error;

/// エンジン内部の参照エラー
///
/// どちらも入力が正しければ発生しないプログラミングエラーであり、
/// 呼び出し側は回復せずにそのまま上位へ伝播させる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("未登録のクリーチャーです: {0}")]
    UnknownCreature(u32),
    #[error("未登録のドローンです: {0}")]
    UnknownDrone(u32),
}
