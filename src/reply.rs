//! Reply payloads and the user-facing texts the bot sends
//!
//! Quick-reply option texts double as valid input at the step that offers
//! them, so labels here must stay in sync with `lexicon` and `command`.

use crate::catalog::QueryOutcome;
use crate::command::{Command, ConfirmChoice, EXIT_KEYWORD};
use crate::lexicon::{semester_label, Publisher, MAX_GRADE, MIN_GRADE};
use crate::state_machine::state::{Coordinate, Preferences};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A selectable option: shown as `label`, sends `text` when tapped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub label: String,
    pub text: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Option whose label is also what it sends
    pub fn echo(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            text: label.clone(),
            label,
        }
    }
}

/// Channel-agnostic reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_options(text: impl Into<String>, quick_replies: Vec<QuickReply>) -> Self {
        Self {
            text: text.into(),
            quick_replies,
        }
    }
}

// ============================================================
// Option sets
// ============================================================

fn publisher_options() -> Vec<QuickReply> {
    Publisher::ALL.iter().map(|p| QuickReply::echo(p.name())).collect()
}

fn grade_options() -> Vec<QuickReply> {
    (MIN_GRADE..=MAX_GRADE)
        .map(|g| QuickReply::new(format!("{g}年級"), g.to_string()))
        .collect()
}

fn semester_options() -> Vec<QuickReply> {
    vec![
        QuickReply::new("上學期", "1"),
        QuickReply::new("下學期", "2"),
    ]
}

fn confirm_options() -> Vec<QuickReply> {
    ConfirmChoice::ALL
        .iter()
        .map(|c| QuickReply::echo(c.label()))
        .collect()
}

fn describe(publisher: &str, grade: u32, semester: u32) -> String {
    format!("{publisher} {grade}年級{}", semester_label(semester))
}

// ============================================================
// Lifecycle and static texts
// ============================================================

pub fn welcome() -> Reply {
    Reply::text(format!(
        "🎉 歡迎使用中文學習小幫手！\n\n我可以幫助您：\n📚 查詢累積字詞\n\n請輸入「{}」開始使用，或輸入「{}」查看詳細說明！",
        Command::StartQuery.keyword(),
        Command::Help.keyword(),
    ))
}

pub fn text_only() -> Reply {
    Reply::text("抱歉，我只能處理文字訊息。")
}

pub fn exit_confirmation() -> Reply {
    Reply::text("已退出當前模式，請輸入新的指令。")
}

pub fn unknown_command() -> Reply {
    Reply::text(format!(
        "抱歉，我不太理解您的意思。請輸入「{}」查看使用說明，或輸入「{}」開始查詢。",
        Command::Help.keyword(),
        Command::StartQuery.keyword(),
    ))
}

pub fn session_error() -> Reply {
    Reply::text("查詢過程出現錯誤，請重新開始")
}

pub fn transient_failure() -> Reply {
    Reply::text("系統暫時無法處理您的訊息，請稍後再試")
}

pub fn query_failed() -> Reply {
    Reply::text("查詢過程中發生錯誤，請稍後再試")
}

pub fn help() -> Reply {
    let text = format!(
        "🎓 中文學習小幫手使用說明

📝 功能介紹：
• 輸入「{start}」開始累積字詞查詢
• 輸入「{sheet}」前往印字帖網站下載練習字帖
• 輸入「{tablet}」前往平板練字頁面
• 輸入「{reset}」清除記憶的版本/年級/學期設定
• 輸入「{exit}」退出當前模式

💡 使用範例：
1. 輸入「{start}」
2. 首次使用：選擇出版社（康軒/南一/翰林）、年級（1-6年級）、學期（上學期/下學期）
3. 再次使用：系統會記住您的設定，直接輸入課次
4. 輸入課次（例如：5）
5. 輸入要查詢的字詞（例如：我好喜歡吃飯配菜）

🔧 其他指令：
• 「{settings}」- 查看記憶的出版社/年級/學期設定
• 「{reset}」- 清除記憶的出版社/年級/學期設定
• 「{exit}」- 退出當前查詢模式

❓ 需要協助請輸入「{help}」",
        start = Command::StartQuery.keyword(),
        sheet = Command::PrintWorksheet.keyword(),
        tablet = Command::TabletPractice.keyword(),
        reset = Command::ResetPreferences.keyword(),
        settings = Command::ShowSettings.keyword(),
        help = Command::Help.keyword(),
        exit = EXIT_KEYWORD,
    );
    Reply::text(text)
}

// ============================================================
// Wizard prompts
// ============================================================

pub fn publisher_prompt() -> Reply {
    Reply::with_options("📚 累積字詞查詢\n\n請選擇出版社：", publisher_options())
}

pub fn restart_publisher_prompt() -> Reply {
    Reply::with_options(
        "🔄 重新設定\n\n📚 累積字詞查詢\n\n請選擇出版社：",
        publisher_options(),
    )
}

pub fn confirm_preferences_prompt(prefs: Preferences) -> Reply {
    Reply::with_options(
        format!(
            "📚 累積字詞查詢\n\n已記憶的設定：{}\n\n請選擇操作：",
            describe(prefs.publisher.name(), prefs.grade, prefs.semester)
        ),
        confirm_options(),
    )
}

pub fn confirm_reprompt() -> Reply {
    let labels: Vec<&str> = ConfirmChoice::ALL.iter().map(|c| c.label()).collect();
    Reply::with_options(
        format!("請選擇：{}、{}、或{}", labels[0], labels[1], labels[2]),
        confirm_options(),
    )
}

pub fn reuse_preferences(publisher: &str, grade: u32, semester: u32) -> Reply {
    Reply::text(format!(
        "✅ 使用已記憶的設定：{}\n\n請輸入課次（例如：5）：",
        describe(publisher, grade, semester)
    ))
}

pub fn edit_lesson(publisher: &str, grade: u32, semester: u32) -> Reply {
    Reply::text(format!(
        "📝 修改課程模式\n\n當前設定：{}\n\n請輸入課次（例如：5）：",
        describe(publisher, grade, semester)
    ))
}

pub fn publisher_reprompt() -> Reply {
    let names: Vec<&str> = Publisher::ALL.iter().map(|p| p.name()).collect();
    Reply::with_options(
        format!("請選擇正確的出版社：{}", names.join("、")),
        publisher_options(),
    )
}

pub fn grade_prompt(publisher: &str) -> Reply {
    Reply::with_options(format!("已選擇：{publisher}\n\n請選擇年級："), grade_options())
}

pub fn grade_reprompt() -> Reply {
    Reply::with_options(
        format!("請輸入正確的年級數字（{MIN_GRADE}-{MAX_GRADE}）"),
        grade_options(),
    )
}

pub fn semester_prompt(publisher: &str, grade: u32) -> Reply {
    Reply::with_options(
        format!("已選擇：{publisher} {grade}年級\n\n請選擇學期："),
        semester_options(),
    )
}

pub fn semester_reprompt() -> Reply {
    Reply::with_options(
        "請選擇正確的學期：1（上學期）或 2（下學期）",
        semester_options(),
    )
}

pub fn lesson_prompt(publisher: &str, grade: u32, semester: u32) -> Reply {
    Reply::text(format!(
        "已選擇：{}\n\n✅ 已記憶您的偏好設定，下次查詢將直接使用\n\n請輸入課次（例如：5）：",
        describe(publisher, grade, semester)
    ))
}

pub fn lesson_reprompt() -> Reply {
    Reply::text("請輸入正確的課次數字")
}

pub fn phrase_prompt(coordinate: &Coordinate) -> Reply {
    Reply::text(format!(
        "已設定：{}第{}課\n\n✅ 已更新偏好設定\n\n請輸入要查詢的字詞（例如：我好喜歡吃飯配菜）：",
        describe(
            coordinate.publisher.name(),
            coordinate.grade,
            coordinate.semester
        ),
        coordinate.lesson
    ))
}

pub fn phrase_reprompt(max_chars: usize) -> Reply {
    Reply::text(format!("請輸入中文字詞進行查詢（最多 {max_chars} 個字）"))
}

pub fn query_result(outcome: &QueryOutcome) -> Reply {
    let mut text = String::from("📊 累積字詞查詢結果\n\n");
    if !outcome.learned.is_empty() {
        let learned: String = outcome.learned.iter().collect();
        let _ = writeln!(text, "✅ 已學過：{learned}");
    }
    if !outcome.not_learned.is_empty() {
        let not_learned: String = outcome.not_learned.iter().collect();
        let _ = writeln!(text, "❌ 尚未學過：{not_learned}");
    }
    let _ = write!(
        text,
        "\n📈 統計：已學 {}/{} 字\n\n💡 輸入新的字詞繼續查詢，或輸入「{EXIT_KEYWORD}」結束查詢",
        outcome.learned.len(),
        outcome.total()
    );
    Reply::text(text)
}

// ============================================================
// Preference commands
// ============================================================

pub fn preferences_cleared() -> Reply {
    Reply::text("✅ 已清除您的偏好設定記憶\n\n下次查詢時將重新選擇出版社、年級和學期")
}

pub fn no_preferences_to_clear() -> Reply {
    Reply::text("目前沒有已記憶的偏好設定")
}

pub fn settings(prefs: Option<Preferences>) -> Reply {
    let Some(prefs) = prefs else {
        return Reply::text(format!(
            "📋 使用者課程設定\n\n❌ 尚未設定任何偏好\n\n請先使用『{}』功能來設定您的偏好設定。",
            Command::StartQuery.keyword()
        ));
    };
    Reply::text(format!(
        "📋 使用者課程設定\n\n✅ 已記憶的偏好設定：\n📚 出版社：{}\n🎓 年級：{}年級\n📅 學期：{}\n\n💡 提示：輸入『{}』開始查詢",
        prefs.publisher,
        prefs.grade,
        semester_label(prefs.semester),
        Command::StartQuery.keyword()
    ))
}

/// Worksheet link, parameterised with the remembered triple when present
pub fn worksheet_url(base: &str, prefs: Option<Preferences>) -> String {
    match prefs {
        Some(p) => format!(
            "{base}?publisher={}&grade={}&semester={}",
            p.publisher.slug(),
            p.grade,
            p.semester
        ),
        None => base.to_string(),
    }
}

pub fn worksheet(base: &str, prefs: Option<Preferences>) -> Reply {
    let url = worksheet_url(base, prefs);
    match prefs {
        Some(p) => Reply::text(format!(
            "📝 印字帖功能\n\n✅ 已使用您的偏好設定：\n📚 {}\n\n🔗 請點擊連結前往印字帖頁面：\n{url}\n\n💡 您可以在網站上選擇要印製的字詞並下載字帖",
            describe(p.publisher.name(), p.grade, p.semester)
        )),
        None => Reply::text(format!(
            "📝 印字帖功能\n\n🔗 請點擊連結前往印字帖頁面：\n{url}\n\n💡 建議您先使用「{}」功能設定版本年級學期，下次使用印字帖功能時會自動帶入您的設定",
            Command::StartQuery.keyword()
        )),
    }
}

pub fn tablet_practice(url: &str) -> Reply {
    Reply::text(format!(
        "✍️ 平板學寫字\n\n🔗 請點擊連結前往平板練字頁面：\n{url}\n\n💡 您可以在平板上直接練習寫字，提供即時筆劃指導"
    ))
}
