//! Reply texts. Everything returned here is Telegram HTML.

use teloxide::utils::html::escape;
use vimrc_core::{Quote, QuotedFile};
use vimrc_models::{NextVimrc, Part, VimrcFile};

pub const NOBODY: &str = "だれもいませんでした";

pub fn help() -> String {
    escape(
        r#"vimrc読書会サポート bot です

!reading_vimrc {command} [{args}...]

start         : 会の開始、"member" は "reset" される(owner)
stop          : 会の終了(owner)
reset         : "member" をリセット(owner)
restore       : "member" を1つ前に戻す(owner)
status        : ステータスの出力
member        : "start" ～ "stop" の間に発言した人を列挙
member_with_count : "member" に発言数も追加して列挙
next {url}... [{part}] : 次回分更新(owner)
request[!] {url} [{comment}] : 読みたい vimrc をリクエストページに追加
help          : 使い方を出力"#,
    )
}

fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(url), escape(text))
}

fn part_notes(part: Option<Part>) -> String {
    match part {
        Some(part @ Part::First) => format!(
            "\n- 今回は{}です。終了時間になったら、途中でも強制終了します\n- 続きは来週読みます\n- いつも通り各自のペースで読むので、どこまで読んだか覚えておきましょう",
            part
        ),
        Some(part @ Part::Middle) => format!(
            "\n- 今回は{}です。終了時間になったら、途中でも強制終了します\n- 前回参加していた方は続きから、参加していなかったら最初からになります\n- 続きは来週読みます\n- いつも通り各自のペースで読むので、どこまで読んだか覚えておきましょう",
            part
        ),
        Some(part @ Part::Last) => {
            format!("\n- 今回は{}です。前回参加した人は続きから読みましょう", part)
        }
        None => String::new(),
    }
}

/// Author and files of the session, each file with a download link.
pub fn summary(next: &NextVimrc, vimrcs: &[VimrcFile]) -> String {
    let mut text = format!(
        "今回読む vimrc: {} さん:",
        link(&next.author.url, &next.author.name)
    );
    for vimrc in vimrcs {
        text.push_str(&format!("\n{}", link(&vimrc.url, &vimrc.name)));
        if let Some(raw_url) = &vimrc.raw_url {
            text.push_str(&format!(" ({})", link(raw_url, "DL")));
        }
    }
    text
}

/// Announcement posted when a session starts.
pub fn starting_message(next: &NextVimrc, vimrcs: &[VimrcFile]) -> String {
    let multi_file = if vimrcs.len() > 1 {
        "\n- 今回は複数ファイルがあるため、filename#L100 のようにファイル名を指定します\n- 省略した場合は直前に参照しファイルか、それがない場合は適当なファイルになります"
    } else {
        ""
    };
    let rules = format!(
        "=== 第{}回 vimrc読書会 ===\n\
        - 途中参加/途中離脱OK。声をかける必要はありません\n\
        - 読む順はとくに決めないので、好きなように読んで好きなように発言しましょう\n\
        - vimrc 内の特定位置を参照する場合は行番号で L100 や L100-110 のように指定します{}\n\
        - 特定の相手に発言/返事する場合は @username を付けます\n\
        - 一通り読み終わったら、読み終わったことを宣言してください。終了の目安にします\n\
        - ただの目安なので、宣言してからでも読み返して全然OKです{}",
        next.id,
        multi_file,
        part_notes(next.part)
    );
    format!("{}\n{}", escape(&rules), summary(next, vimrcs))
}

/// Plain text sent to the activity webhook.
pub fn activity_summary(next: &NextVimrc, vimrcs: &[VimrcFile]) -> String {
    let mut text = format!(
        "=== 第{}回 vimrc読書会 ===\n今回読む vimrc: [{}]({}) さん:",
        next.id, next.author.name, next.author.url
    );
    for vimrc in vimrcs {
        text.push_str(&format!("\n[{}]({})", vimrc.name, vimrc.url));
        if let Some(raw_url) = &vimrc.raw_url {
            text.push_str(&format!(" ([DL]({}))", raw_url));
        }
    }
    text
}

/// Reported when a session file cannot be downloaded at start.
pub fn load_failed(name: &str) -> String {
    format!("ERROR: {} の読み込みに失敗しました", escape(name))
}

/// Sorted participants followed by the log link.
pub fn members(names: &[String], log_url: &str) -> String {
    if names.is_empty() {
        return NOBODY.to_string();
    }
    format!("{}\n\n{}", escape(&names.join("\n")), escape(log_url))
        .trim_end()
        .to_string()
}

/// `%03d回 : name` per participant followed by the log link.
pub fn members_with_count(counts: &[(String, usize)], log_url: &str) -> String {
    if counts.is_empty() {
        return NOBODY.to_string();
    }
    let lines: Vec<String> = counts
        .iter()
        .map(|(name, count)| format!("{:03}回 : {}", count, escape(name)))
        .collect();
    format!("{}\n\n{}", lines.join("\n"), escape(log_url))
        .trim_end()
        .to_string()
}

/// Closing words. A session continuing next week asks to remember the
/// position; otherwise the request page is offered.
pub fn stopped(part: Option<Part>, request_page: &str) -> String {
    match part {
        Some(part) if part.continues() => {
            "おつかれさまでした。次回は続きを読むので、どこまで読んだか覚えておきましょう！".to_string()
        }
        _ => format!(
            "おつかれさまでした。次回読む vimrc を決めましょう！\n{}",
            escape(request_page)
        ),
    }
}

pub fn archived(id: u32, archive_url: &str) -> String {
    format!(
        "アーカイブページを更新しました: {}",
        link(archive_url, &format!("第{}回", id))
    )
}

pub fn next_updated(next: &NextVimrc) -> String {
    let part = next.part.map(|p| format!(" ({})", p)).unwrap_or_default();
    format!(
        "次回予告を更新しました:\n次回 第{}回 {} {} さん{}",
        next.id,
        escape(&next.date),
        link(&next.author.url, &next.author.name),
        part
    )
}

pub fn requested(request_page: &str) -> String {
    format!("vimrc を{}に追加しました", link(request_page, "リクエストページ"))
}

pub fn not_requested(request_page: &str) -> String {
    format!(
        "何らかの理由により、{}は更新されませんでした",
        link(request_page, "リクエストページ")
    )
}

pub fn already_read(author: &str) -> String {
    format!(
        "{} さんの vimrc は過去に読まれています。\n再リクエストの場合は request! を使ってください",
        escape(author)
    )
}

pub fn not_github_url(url: &str) -> String {
    format!("GitHub のファイルの URL を指定してください: {}", escape(url))
}

pub fn file_not_found(name: &str) -> String {
    format!("File not found: {}", escape(name))
}

pub fn error(e: &dyn std::fmt::Display) -> String {
    format!("ERROR: {}", escape(&e.to_string()))
}

/// Quoted lines with a link to the range and to installed plugins.
pub fn quote(file: &QuotedFile) -> String {
    let blocks: Vec<String> = file
        .quotes
        .iter()
        .map(|quote| match quote {
            Quote::Excerpt(excerpt) => {
                let mut block = format!(
                    "{}\n<pre>{}</pre>",
                    link(
                        &format!("{}{}", file.key, excerpt.fragment),
                        &format!("{}{}", file.name, excerpt.fragment)
                    ),
                    escape(&excerpt.numbered().join("\n"))
                );
                for plugin in &excerpt.plugins {
                    block.push_str(&format!("\n{}", link(&plugin.url, &plugin.repo)));
                }
                block
            }
            Quote::InvalidRange(token) => format!("無効な範囲です: {}", escape(token)),
        })
        .collect();
    blocks.join("\n")
}
