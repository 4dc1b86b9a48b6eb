/*
 * Responsibility
 * - HTTP 横断の middleware (request-id, trace, body limit, timeout)
 * - token / predicate middleware は token_gate 側にあり、api::v1::routes で適用する
 */
pub mod http;
