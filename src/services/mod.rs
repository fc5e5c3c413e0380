/*
 * Responsibility
 * - 外部との境界になる service (token -> claims の resolver)
 */
pub mod resolver;
