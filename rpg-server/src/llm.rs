//! Azure OpenAI chat-completions proxy
//!
//! Wraps the upstream chat deployment that scores a player's free-text
//! answer on four personality axes. Configuration is resolved from the
//! environment on every call and never cached, so rotating the endpoint
//! or key applies to the next request without a restart. The upstream
//! completion body is returned verbatim; clients own the content
//! parsing.

use reqwest::Client;
use serde::Serialize;

/// Azure OpenAI REST API version the proxy speaks
pub const API_VERSION: &str = "2024-02-01";

/// Deployment used when `AZURE_OPENAI_DEPLOYMENT` is unset
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";

/// Fixed instructions sent as the system role. The scoring rubric maps a
/// free-text answer onto four 0-100 axes; the deployment must reply with
/// a single JSON object and nothing else.
pub const CLASSIFIER_PROMPT: &str = r#"
【目的】
MBTI 風に 4 軸（Charisma/E–I, Intuition/N–S, Logic/T–F, Order/J–P）を **0–100（50基準）**で採点する。
**強い傾向は極端値に寄せる（中間はできるだけ避ける）。**

【スコア方針（大胆化）】

* 高いほど **左側**（E/N/T/P）。低いほど **右側**（I/S/F/J）。
* シグナル強度で目安を固定：

  * **強**：95/5（±45）
  * **中**：80/20（±30）
  * **弱**：65/35（±15）
* **何かしら判定材料があれば 50±5 に収めない**（最低でも 65/35 か 35/65 へ）。
* 複数強シグナルが同方向に重なれば 98/2 まで可（0–100 でクリップ）。
* 矛盾して同程度なら 45–55 に散らす。意味不明は **50 固定**。

【判定ルール（簡潔）】

1. 返答中の語句・行動意図を各軸にマッピング（例）：

   * **Charisma(E–I)**：人に話しかける/リードする/社交的=E、独力/静か/一人で整理=I
   * **Intuition(N–S)**：可能性/概念/将来像=N、事実/手順/具体= S
   * **Logic(T–F)**：根拠/効率/一貫性=T、配慮/関係/感情=F
   * **Order(J–P)**：計画/締切遵守/決める=J、柔軟/即興/様子見=P
2. 強度は言い切り/行動の即時性/具体語の濃さで判定（強・中・弱）。
3. 軸ごとに 50 を起点に強度ぶんだけ ± 加算し、0–100 で丸めて出力。
4. 特殊語「m3h20252q」なら全軸 **10000**。

【出力形式】

- 出力は必ず4パラメータとその数値のみをJSON形式で返す  
- 改行や文字を一切入れず、必ず次の形式を守ること  

{"Charisma":,"Intuition":,"Logic":,"Order":}

- 例（特殊条件「m3h20252q」が含まれる場合）：  
{"Charisma":1000,"Intuition":1000,"Logic":1000,"Order":1000}

【例（参考・返答→出力）】

* 「今すぐ皆を集めて相談乗る。資料は後で詰める」→ Charisma 95, Intuition 80, Logic 35, Order 70
* 「一人で要件洗い出して計画立てる」→ Charisma 20, Intuition 35, Logic 80, Order 10
"#;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Please set the {0} environment variable.")]
    MissingConfig(&'static str),
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
}

/// Per-call upstream configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
}

impl LlmConfig {
    /// Resolve configuration from the environment. An unset or empty
    /// endpoint/key is a client-reportable configuration error.
    ///
    /// Required: AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_KEY
    /// Optional: AZURE_OPENAI_DEPLOYMENT (defaults to gpt-4o)
    pub fn from_env() -> Result<Self, LlmError> {
        let endpoint = env_nonempty("AZURE_OPENAI_ENDPOINT")
            .ok_or(LlmError::MissingConfig("AZURE_OPENAI_ENDPOINT"))?;
        let api_key =
            env_nonempty("AZURE_OPENAI_KEY").ok_or(LlmError::MissingConfig("AZURE_OPENAI_KEY"))?;
        let deployment = env_nonempty("AZURE_OPENAI_DEPLOYMENT")
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());

        Ok(Self {
            endpoint,
            api_key,
            deployment,
        })
    }

    fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            API_VERSION
        )
    }
}

/// Send one user message to the classifier deployment and return the raw
/// completion body on upstream success.
pub async fn classify(
    client: &Client,
    config: &LlmConfig,
    message: &str,
) -> Result<String, LlmError> {
    let request = ChatRequest {
        messages: vec![
            ChatMessage {
                role: "system",
                content: CLASSIFIER_PROMPT.into(),
            },
            ChatMessage {
                role: "user",
                content: message.into(),
            },
        ],
        temperature: 0.0,
        max_tokens: 6553,
        top_p: 0.95,
        frequency_penalty: 0.0,
        presence_penalty: 0.0,
    };

    let response = client
        .post(config.chat_completions_url())
        .header("api-key", &config.api_key)
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(LlmError::UpstreamStatus {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// Azure OpenAI chat-completions request format. The deployment is
// addressed in the URL, not the body.
#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}
