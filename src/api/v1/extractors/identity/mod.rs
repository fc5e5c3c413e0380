/*!
 * Identity extractor
 *
 * Responsibility:
 * - Authenticator が extensions に置いた Identity を handler に渡す
 *
 * Public API:
 * - CurrentIdentity
 */

mod core;

pub use self::core::CurrentIdentity;
