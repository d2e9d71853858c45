//! HTML page generator.
//!
//! Produces a self-contained HTML page with all CSS/JS inlined. The page is a
//! pure function of the [`ViewState`] it is given.

use anyhow::{Context, Result};
use std::path::Path;

use essaymark_core::annotate::{LevelTally, Segment};
use essaymark_core::model::{CefrLevel, EvaluationResult, ScoreBand};
use essaymark_core::view::{Phase, ViewState};

/// Where the page posts new submissions.
const SUBMIT_PATH: &str = "/api/essay_evaluation/view";

/// Header carrying the per-tab session id the server uses to reject duplicates.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shown when a submission gets no page back.
const NETWORK_ERROR: &str = "评估失败，请稍后重试";

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Render the evaluator page for `view`.
pub fn render_page(view: ViewState) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>英语作文评估</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n<h1>英语作文评估</h1>\n</header>\n");

    push_form(&mut html, &view);

    if let Some(error) = &view.error {
        html.push_str(&format!(
            "<div class=\"error\" role=\"alert\">{}</div>\n",
            html_escape(error)
        ));
    }

    if view.phase == Phase::Ready {
        if let Some(result) = &view.result {
            let segments = view.segments();
            let tally = LevelTally::from_segments(&segments);
            push_annotated_essay(&mut html, &segments, &tally);
            push_scores(&mut html, result);
            push_complexity(&mut html, result);
            push_cefr(&mut html, result);
            push_sentence_analysis(&mut html, result);
        }
    }

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the rendered page to a file.
pub fn write_html_report(view: ViewState, path: &Path) -> Result<()> {
    let html = render_page(view);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn push_form(html: &mut String, view: &ViewState) {
    let (disabled, label) = match view.phase {
        Phase::Loading => (" disabled", "评估中..."),
        _ if !view.can_submit() => (" disabled", "提交评估"),
        _ => ("", "提交评估"),
    };

    html.push_str(&format!(
        "<form id=\"essay-form\" data-action=\"{SUBMIT_PATH}\" data-session-header=\"{SESSION_HEADER}\" \
         data-error=\"{NETWORK_ERROR}\" data-phase=\"{}\">\n",
        phase_name(view.phase)
    ));
    html.push_str(&format!(
        "<textarea name=\"text\" id=\"essay-text\" rows=\"12\" placeholder=\"在此粘贴英语作文\">{}</textarea>\n",
        html_escape(&view.essay_text)
    ));
    html.push_str(&format!(
        "<button type=\"submit\" id=\"submit\"{disabled}>{label}</button>\n"
    ));
    html.push_str("</form>\n");
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Loading => "loading",
        Phase::Ready => "ready",
        Phase::Failed => "failed",
    }
}

fn push_annotated_essay(html: &mut String, segments: &[Segment], tally: &LevelTally) {
    html.push_str("<section class=\"annotated\">\n");
    html.push_str("<h2>词汇等级标注</h2>\n");

    // Legend
    html.push_str("<ul class=\"legend\">\n");
    for level in CefrLevel::ALL {
        html.push_str(&format!(
            "<li><span class=\"word {}\">{}</span> {}</li>\n",
            level.css_class(),
            level,
            tally.count(level)
        ));
    }
    html.push_str(&format!(
        "<li><span class=\"word other\">其他</span> {}</li>\n",
        tally.other
    ));
    html.push_str("</ul>\n");

    html.push_str("<p class=\"essay\">");
    for segment in segments {
        if segment.is_word() {
            html.push_str(&format!(
                "<span class=\"word {}\">{}</span>",
                segment.css_class(),
                html_escape(&segment.text)
            ));
        } else {
            html.push_str(&html_escape(&segment.text));
        }
    }
    html.push_str("</p>\n");
    html.push_str("</section>\n");
}

fn push_scores(html: &mut String, result: &EvaluationResult) {
    html.push_str("<section class=\"scores\">\n");
    html.push_str("<h2>评分</h2>\n");
    html.push_str(&format!(
        "<p class=\"overall\">总体评分 <span class=\"score {}\">{}</span></p>\n",
        ScoreBand::from_score(result.overall_score).css_class(),
        format_score(result.overall_score)
    ));

    html.push_str("<table class=\"dimensions\">\n");
    html.push_str("<thead><tr><th>维度</th><th>得分</th><th>评价</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (label, dimension) in result.dimensions() {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"score {}\">{}</td><td>{}</td></tr>\n",
            label,
            ScoreBand::from_score(dimension.score).css_class(),
            format_score(dimension.score),
            html_escape(&dimension.commentary)
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");
}

fn push_complexity(html: &mut String, result: &EvaluationResult) {
    let stats = &result.complexity;
    html.push_str("<section class=\"complexity\">\n");
    html.push_str("<h2>语言复杂度统计</h2>\n");
    html.push_str("<dl>\n");
    html.push_str(&format!("<dt>总词数</dt><dd>{}</dd>\n", stats.total_words));
    html.push_str(&format!(
        "<dt>总句子数</dt><dd>{}</dd>\n",
        stats.total_sentences
    ));
    html.push_str(&format!(
        "<dt>平均单词长度</dt><dd>{}</dd>\n",
        html_escape(&stats.avg_word_length)
    ));
    html.push_str(&format!(
        "<dt>平均句子长度</dt><dd>{}</dd>\n",
        html_escape(&stats.avg_sentence_length)
    ));
    html.push_str("</dl>\n");
    html.push_str("</section>\n");
}

fn push_cefr(html: &mut String, result: &EvaluationResult) {
    let cefr = &result.cefr;
    html.push_str("<section class=\"cefr\">\n");
    html.push_str("<h2>CEFR词汇等级</h2>\n");
    html.push_str("<dl>\n");
    for (label, value) in [
        ("A级词汇占比", &cefr.percent_a),
        ("B级词汇占比", &cefr.percent_b),
        ("C级词汇占比", &cefr.percent_c),
    ] {
        html.push_str(&format!(
            "<dt>{label}</dt><dd>{}</dd>\n",
            html_escape(value)
        ));
    }
    html.push_str("</dl>\n");
    html.push_str(&format!(
        "<p class=\"commentary\">{}</p>\n",
        html_escape(&cefr.vocabulary_commentary)
    ));

    html.push_str("<ul class=\"level-words\">\n");
    for level in CefrLevel::BY_PRIORITY {
        let words = cefr.words_by_level.get(level);
        if words.is_empty() {
            continue;
        }
        let escaped: Vec<String> = words.iter().map(|w| html_escape(w)).collect();
        html.push_str(&format!(
            "<li><span class=\"word {}\">{}</span> {}</li>\n",
            level.css_class(),
            level,
            escaped.join(", ")
        ));
    }
    html.push_str("</ul>\n");
    html.push_str("</section>\n");
}

fn push_sentence_analysis(html: &mut String, result: &EvaluationResult) {
    if result.sentence_comments.is_empty() {
        return;
    }

    html.push_str("<section class=\"sentences\">\n");
    html.push_str("<h2>逐句点评</h2>\n");
    for (paragraph, sentences) in result.sentence_comments.iter() {
        html.push_str(&format!("<h3>{}</h3>\n", html_escape(paragraph)));
        for (label, sentence) in sentences.iter() {
            html.push_str("<div class=\"sentence\">\n");
            html.push_str(&format!(
                "<p><span class=\"label\">{}</span> {}</p>\n",
                html_escape(label),
                html_escape(&sentence.sentence_text)
            ));
            if !sentence.comments.is_empty() {
                html.push_str("<ul>\n");
                for comment in &sentence.comments {
                    html.push_str(&format!("<li>{}</li>\n", html_escape(comment)));
                }
                html.push_str("</ul>\n");
            }
            if let Some(suggestion) = &sentence.suggestion {
                html.push_str(&format!(
                    "<p class=\"suggestion\">修改建议：{}</p>\n",
                    html_escape(suggestion)
                ));
            }
            html.push_str("</div>\n");
        }
    }
    html.push_str("</section>\n");
}

/// Whole scores print without a fractional part.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --good: #16a34a; --fair: #d97706; --poor: #dc2626; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'PingFang SC', sans-serif; margin: 0 auto; padding: 2rem; max-width: 960px; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
textarea { width: 100%; font: inherit; padding: 0.5rem; box-sizing: border-box; }
button { margin-top: 0.5rem; padding: 0.5rem 1.5rem; font: inherit; cursor: pointer; }
button[disabled] { cursor: not-allowed; opacity: 0.6; }
.error { margin: 1rem 0; padding: 0.75rem 1rem; border-left: 4px solid var(--poor); background: #fde2e2; }
.essay { white-space: pre-wrap; line-height: 1.8; font-size: 1.05rem; }
.legend, .level-words { list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 1rem; }
.word.a1 { color: #9BA7AF; }
.word.a2 { color: #077015; }
.word.b1 { color: #0072E4; }
.word.b2 { color: #710882; }
.word.c1 { color: #D4AC0D; }
.word.c2 { color: #DE682C; }
.word.other { color: #000; }
.legend .word, .level-words .word { font-weight: bold; }
.score { font-weight: bold; }
.score.good { color: var(--good); }
.score.fair { color: var(--fair); }
.score.poor { color: var(--poor); }
.overall .score { font-size: 2rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
dl { display: grid; grid-template-columns: max-content auto; gap: 0.25rem 1rem; }
dd { margin: 0; }
.sentence { border-bottom: 1px solid var(--border); padding: 0.5rem 0; }
.sentence .label { color: #6b7280; }
.suggestion { color: var(--good); }
"#;

const JS: &str = r#"
(function () {
  const form = document.getElementById('essay-form');
  const text = document.getElementById('essay-text');
  const button = document.getElementById('submit');
  const idleLabel = '提交评估';
  const refresh = () => {
    if (form.dataset.phase !== 'loading') button.disabled = text.value.trim() === '';
  };
  const sessionId = () => {
    let id = sessionStorage.getItem('essaymark-session');
    if (!id) {
      id = window.crypto && crypto.randomUUID
        ? crypto.randomUUID()
        : Date.now().toString(36) + Math.random().toString(36).slice(2);
      sessionStorage.setItem('essaymark-session', id);
    }
    return id;
  };
  const showError = (message) => {
    let alert = document.querySelector('.error[role=alert]');
    if (!alert) {
      alert = document.createElement('div');
      alert.className = 'error';
      alert.setAttribute('role', 'alert');
      form.insertAdjacentElement('afterend', alert);
    }
    alert.textContent = message;
  };
  text.addEventListener('input', refresh);
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    if (button.disabled) return;
    form.dataset.phase = 'loading';
    button.disabled = true;
    button.textContent = '评估中...';
    try {
      const response = await fetch(form.dataset.action, {
        method: 'POST',
        headers: {
          'Content-Type': 'application/json',
          [form.dataset.sessionHeader]: sessionId(),
        },
        body: JSON.stringify({ text: text.value }),
      });
      const type = response.headers.get('content-type') || '';
      if (!type.startsWith('text/html')) throw new Error(response.status);
      const page = await response.text();
      document.open();
      document.write(page);
      document.close();
    } catch (err) {
      form.dataset.phase = 'failed';
      button.textContent = idleLabel;
      refresh();
      showError(form.dataset.error);
    }
  });
})();
"#;
