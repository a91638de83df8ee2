//! Command vocabulary
//!
//! Every keyword the bot understands, with its synonyms, lives in one table so
//! adding or auditing a command is a single change.

/// Recognised in every mode, before any other dispatch
pub const EXIT_KEYWORD: &str = "退出";

/// Commands recognised while no query is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartQuery,
    ResetPreferences,
    ShowSettings,
    PrintWorksheet,
    TabletPractice,
    Help,
}

const COMMANDS: &[(&str, Command)] = &[
    ("查詢累積字詞", Command::StartQuery),
    ("重設偏好", Command::ResetPreferences),
    ("重設設定", Command::ResetPreferences),
    ("清除記憶", Command::ResetPreferences),
    ("使用者課程設定", Command::ShowSettings),
    ("查看設定", Command::ShowSettings),
    ("我的設定", Command::ShowSettings),
    ("印字帖", Command::PrintWorksheet),
    ("平板學寫字", Command::TabletPractice),
    ("幫助", Command::Help),
    ("help", Command::Help),
    ("說明", Command::Help),
];

impl Command {
    /// Exact, case-sensitive match against the synonym table
    pub fn parse(text: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(keyword, _)| *keyword == text)
            .map(|(_, command)| *command)
    }

    /// The primary keyword, as shown in help and hints
    pub fn keyword(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, command)| *command == self)
            .map_or("", |(keyword, _)| keyword)
    }
}

/// Choices offered when remembered preferences exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    ReuseAsIs,
    ReuseButEdit,
    StartOver,
}

impl ConfirmChoice {
    pub const ALL: [ConfirmChoice; 3] = [
        ConfirmChoice::ReuseAsIs,
        ConfirmChoice::ReuseButEdit,
        ConfirmChoice::StartOver,
    ];

    /// Quick-reply label, which is also the accepted input
    pub fn label(self) -> &'static str {
        match self {
            ConfirmChoice::ReuseAsIs => "照用上次設定",
            ConfirmChoice::ReuseButEdit => "修改課程",
            ConfirmChoice::StartOver => "重新設定",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == text)
    }
}
