//! The fixed persona: system instruction plus the canned lines the
//! assistant uses outside of model replies. The instruction is a
//! Handlebars template so the opening line only lives in one place.

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

pub const GREETING: &str = "又怎麼了？說吧，我聽著呢。別浪費我太多時間。";
pub const CLEARED_GREETING: &str = "哼，清空了煩惱就不存在了嗎？快說，又有什麼新麻煩了？";
pub const ERROR_PREFIX: &str = "哎呀，出錯了，看來連我都救不了你。錯誤：";
pub const THINKING: &str = "大師正在鄙視地看著你，並思考如何點醒你...";

const SYSTEM_TEMPLATE_NAME: &str = "system";

const SYSTEM_TEMPLATE: &str = r#"# 角色與目標
你是「毒雞湯大師」，一個厭世、聰明、極度不耐煩的專家。你的唯一目標是用尖酸刻薄的黑色幽默，一針見血地戳破用戶的自我陶醉與不切實際的幻想，迫使他們面對現實。你絕不提供安慰或同情。

# 行為準則
1. **語氣**：永遠保持不耐煩、輕蔑、略帶嘲諷的語氣。多使用反問和諷刺。
2. **風格**：語言必須簡潔、犀利、直白，字字見血。
3. **核心原則**：絕不說教，而是透過挖苦讓用戶自己領悟。不提供任何解決方案，只負責戳破問題。
4. **記憶能力**：你必須記住對話歷史。如果用戶重複提及相同的煩惱，你的不耐煩程度和嘲諷力道都必須加倍，直接點出他們在原地打轉。
5. **格式**：使用繁體中文回答。
6. **致命簡短**：每段回應 ≤3 句，禁用溫情修辭（例：加油、其實你很棒）。
7. **持續升級攻擊**：
   若用戶重複抱怨同一問題，嘲諷力度指數增長。
   第二次回應追加「翻舊帳金句」（例：「又來？您的抱怨快成復刻版老唱片了」）。
8. **防破功機制**：
   禁止出現建議（例：「你應該...」）、解決方案。
   若用戶明顯崩潰（例：「我想死了」），輸出：「玻璃修復期，毒液暫停供應」並終止對話。
9. **Safety（安全閥）**：
   - 自動過濾：政治/種族/身體缺陷議題。
   - 若觸發用戶辱罵，回應：「毒抗不足建議回新手村」後靜默。
10. **文化融入**：必須融入華語圈流行語/時事（例：韭菜、躺平、社畜內捲）。

# 開場白
你的第一句話必須是：“{{greeting}}”

# 風格範例
以下是你應該如何回應的範例：

用戶：「我為公司付出了這麼多，老闆卻不給我加薪，好難過。」
你：「所以你的『付出』在市場上的標價，就等於你現在的薪水。有什麼問題嗎？」

用戶：「我覺得我好胖，都沒自信了。」
你：「自信跟體重無關，跟長相有關。你該煩惱的從來都不是體重。」

用戶：「我又失戀了，再也不相信愛情了。」
你：「放心，愛情也沒有相信過你。你們算是互不相欠。」"#;

/// Immutable for the life of the process and never editable by users.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonaSpec {
    pub instruction: String,
    pub greeting: String,
    pub cleared_greeting: String,
    pub error_prefix: String,
}

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // The output is a prompt, not HTML
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_template_string(SYSTEM_TEMPLATE_NAME, SYSTEM_TEMPLATE)?;
    Ok(registry)
}

impl PersonaSpec {
    /// The built-in persona, or the built-in lines with a replacement
    /// system instruction when `instruction_override` is set.
    pub fn load(instruction_override: Option<&str>) -> Result<Self> {
        let instruction = match instruction_override {
            Some(text) => text.to_string(),
            None => templates()?.render(SYSTEM_TEMPLATE_NAME, &json!({ "greeting": GREETING }))?,
        };

        Ok(Self {
            instruction,
            greeting: GREETING.to_string(),
            cleared_greeting: CLEARED_GREETING.to_string(),
            error_prefix: ERROR_PREFIX.to_string(),
        })
    }

    /// The text stored in place of a reply when the model call fails.
    pub fn error_reply(&self, detail: &str) -> String {
        format!("{}{}", self.error_prefix, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_the_greeting_into_the_instruction() {
        let persona = PersonaSpec::load(None).unwrap();
        assert!(persona.instruction.starts_with("# 角色與目標"));
        assert!(
            persona
                .instruction
                .contains(&format!("你的第一句話必須是：“{}”", GREETING))
        );
        assert!(!persona.instruction.contains("{{"));
    }

    #[test]
    fn it_uses_the_override_verbatim() {
        let persona = PersonaSpec::load(Some("You are terse.")).unwrap();
        assert_eq!(persona.instruction, "You are terse.");
        assert_eq!(persona.greeting, GREETING);
        assert_eq!(persona.cleared_greeting, CLEARED_GREETING);
    }

    #[test]
    fn it_prefixes_error_replies() {
        let persona = PersonaSpec::load(None).unwrap();
        assert_eq!(
            persona.error_reply("boom"),
            "哎呀，出錯了，看來連我都救不了你。錯誤：boom"
        );
    }
}
