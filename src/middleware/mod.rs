/*
 * Responsibility
 * - middleware の公開インターフェース
 * - token: トークン検出 → decode → attributes へ書き込み (拒否はしない)
 * - predicate: attributes を見て next を呼ぶか error response を返すか決める
 */
pub mod predicate;
pub mod responders;
pub mod token;
