use thiserror::Error;

/// Input-validation errors raised by skill entry points before any network
/// access. Transport and upstream failures are never surfaced this way; they
/// are folded into the result record's `error` field instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkillError {
    /// A required field was empty. Carries the user-facing field name.
    #[error("{0}は空にできません。")]
    EmptyField(&'static str),

    /// A credential is neither in the config file nor in the environment.
    #[error("{what}が必要です。`skillpack configure` を実行するか、環境変数 {env} で指定してください。")]
    MissingCredential {
        what: &'static str,
        env: &'static str,
    },

    #[error("メッセージが長すぎます（{0}文字）。最大{max}文字です。", max = crate::line::MAX_MESSAGE_CHARS)]
    MessageTooLong(usize),

    #[error("画像URLはHTTPSである必要があります。")]
    InsecureImageUrl,

    #[error("最低価格は最高価格以下で指定してください。")]
    InvertedPriceRange,
}
