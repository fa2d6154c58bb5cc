//! Locator compilation to in-page JavaScript
//!
//! Each locator compiles to an expression that collects every matching
//! element, so action scripts can enforce the exactly-one-match rule and
//! report how many candidates they saw. All scripts return the same
//! `{ ok, count, reason }` object, which [`DomOutcome`] deserializes.

use serde::Deserialize;

use webproof_flow::Locator;

/// Result object returned by every generated script
#[derive(Debug, Clone, Deserialize)]
pub struct DomOutcome {
    pub ok: bool,
    pub count: usize,
    #[serde(default)]
    pub reason: String,
}

/// Escape a Rust string into a JavaScript string literal
fn js_string(value: &str) -> String {
    // JSON string escaping is valid JavaScript
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// CSS selector covering the implicit HTML elements for an ARIA role,
/// plus anything carrying the role explicitly
fn role_selector(role: &str) -> String {
    match role {
        "button" => {
            "button, input[type=\"button\"], input[type=\"submit\"], input[type=\"reset\"], [role=\"button\"]"
                .to_string()
        }
        "heading" => "h1, h2, h3, h4, h5, h6, [role=\"heading\"]".to_string(),
        "link" => "a[href], [role=\"link\"]".to_string(),
        "textbox" => {
            "input:not([type]), input[type=\"text\"], input[type=\"email\"], input[type=\"password\"], input[type=\"search\"], input[type=\"tel\"], input[type=\"url\"], textarea, [role=\"textbox\"]"
                .to_string()
        }
        "checkbox" => "input[type=\"checkbox\"], [role=\"checkbox\"]".to_string(),
        "radio" => "input[type=\"radio\"], [role=\"radio\"]".to_string(),
        "listitem" => "li, [role=\"listitem\"]".to_string(),
        // role charset is validated at parse time, safe to interpolate
        other => format!("[role=\"{other}\"]"),
    }
}

/// JavaScript expression evaluating to an array of elements matching the
/// locator, resolved against the live DOM at evaluation time
pub fn collect_expr(locator: &Locator) -> String {
    match locator {
        Locator::Id { id } => {
            format!(
                "(function() {{ const el = document.getElementById({id}); return el ? [el] : []; }})()",
                id = js_string(id)
            )
        }
        Locator::Label { text } => {
            format!(
                "(function() {{ \
                   const wanted = {text}; \
                   const matches = []; \
                   for (const label of document.querySelectorAll('label')) {{ \
                     if (!(label.textContent || '').includes(wanted)) continue; \
                     if (label.htmlFor) {{ \
                       const el = document.getElementById(label.htmlFor); \
                       if (el) matches.push(el); \
                       continue; \
                     }} \
                     const nested = label.querySelector('input, textarea, select'); \
                     if (nested) matches.push(nested); \
                   }} \
                   for (const el of document.querySelectorAll('[aria-label]')) {{ \
                     if ((el.getAttribute('aria-label') || '').includes(wanted)) matches.push(el); \
                   }} \
                   return Array.from(new Set(matches)); \
                 }})()",
                text = js_string(text)
            )
        }
        Locator::Role { role, name } => {
            let selector = js_string(&role_selector(role));
            match name {
                Some(name) => format!(
                    "(function() {{ \
                       const wanted = {name}; \
                       return Array.from(document.querySelectorAll({selector})).filter(el => \
                         ((el.innerText || el.textContent || '').includes(wanted)) || \
                         ((el.getAttribute('aria-label') || '').includes(wanted)) || \
                         ((el.value || '').includes(wanted))); \
                     }})()",
                    name = js_string(name)
                ),
                None => format!(
                    "Array.from(document.querySelectorAll({selector}))"
                ),
            }
        }
        Locator::Text { pattern } => {
            format!(
                "(function() {{ \
                   const re = new RegExp({pattern}); \
                   const all = Array.from(document.querySelectorAll('body *')).filter(el => \
                     el.tagName !== 'SCRIPT' && el.tagName !== 'STYLE' && re.test(el.textContent || '')); \
                   return all.filter(el => !all.some(other => other !== el && el.contains(other))); \
                 }})()",
                pattern = js_string(pattern)
            )
        }
    }
}

/// Script that fills the uniquely matching form control.
///
/// The value goes through the native value setter and synthetic
/// `input`/`change` events so framework-controlled inputs observe it.
pub fn fill_script(locator: &Locator, value: &str) -> String {
    format!(
        "(function() {{ \
           const els = {collect}; \
           if (els.length !== 1) {{ return {{ ok: false, count: els.length, reason: '' }}; }} \
           const el = els[0]; \
           const tag = el.tagName; \
           if (tag === 'INPUT' || tag === 'TEXTAREA') {{ \
             const proto = tag === 'TEXTAREA' ? window.HTMLTextAreaElement.prototype : window.HTMLInputElement.prototype; \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
             el.focus(); \
             setter.call(el, {value}); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return {{ ok: true, count: 1, reason: '' }}; \
           }} \
           if (el.isContentEditable) {{ \
             el.focus(); \
             el.textContent = {value}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             return {{ ok: true, count: 1, reason: '' }}; \
           }} \
           return {{ ok: false, count: 1, reason: 'element <' + tag.toLowerCase() + '> is not fillable' }}; \
         }})()",
        collect = collect_expr(locator),
        value = js_string(value)
    )
}

/// Script that clicks the uniquely matching element
pub fn click_script(locator: &Locator) -> String {
    format!(
        "(function() {{ \
           const els = {collect}; \
           if (els.length !== 1) {{ return {{ ok: false, count: els.length, reason: '' }}; }} \
           const el = els[0]; \
           el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
           el.click(); \
           return {{ ok: true, count: 1, reason: '' }}; \
         }})()",
        collect = collect_expr(locator)
    )
}

/// Script reporting whether any matching element is currently visible
pub fn visible_script(locator: &Locator) -> String {
    format!(
        "(function() {{ \
           const els = {collect}; \
           let visible = 0; \
           for (const el of els) {{ \
             const style = window.getComputedStyle(el); \
             if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') continue; \
             const rect = el.getBoundingClientRect(); \
             if (rect.width > 0 && rect.height > 0) visible += 1; \
           }} \
           return {{ ok: visible > 0, count: els.length, reason: '' }}; \
         }})()",
        collect = collect_expr(locator)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string("a\"b"), r#""a\"b""#);
        assert_eq!(js_string("line1\nline2"), r#""line1\nline2""#);
    }

    #[test]
    fn test_role_selector_covers_implicit_elements() {
        let button = role_selector("button");
        assert!(button.contains("input[type=\"submit\"]"));
        assert!(button.contains("[role=\"button\"]"));

        let heading = role_selector("heading");
        assert!(heading.contains("h1"));
        assert!(heading.contains("h6"));
    }

    #[test_case("switch")]
    #[test_case("tab")]
    #[test_case("menuitem")]
    fn test_role_selector_falls_back_to_role_attribute(role: &str) {
        assert_eq!(role_selector(role), format!("[role=\"{role}\"]"));
    }

    #[test]
    fn test_id_collect_uses_get_element_by_id() {
        let expr = collect_expr(&Locator::id("username"));
        assert!(expr.contains("document.getElementById(\"username\")"));
        assert!(expr.contains("[el] : []"));
    }

    #[test]
    fn test_label_collect_resolves_html_for() {
        let expr = collect_expr(&Locator::label("Email"));
        assert!(expr.contains("label.htmlFor"));
        assert!(expr.contains("\"Email\""));
        assert!(expr.contains("aria-label"));
    }

    #[test]
    fn test_role_with_name_filters_by_text() {
        let expr = collect_expr(&Locator::role_named("button", "Login"));
        assert!(expr.contains("\"Login\""));
        assert!(expr.contains("innerText"));
        assert!(expr.contains("el.value"));
    }

    #[test]
    fn test_text_collect_keeps_innermost_matches() {
        let expr = collect_expr(&Locator::text("user2|user3"));
        assert!(expr.contains("new RegExp(\"user2|user3\")"));
        assert!(expr.contains("el.contains(other)"));
        assert!(expr.contains("SCRIPT"));
    }

    #[test]
    fn test_fill_script_uses_native_setter_and_events() {
        let script = fill_script(&Locator::label("Password"), "hunter2");
        assert!(script.contains("getOwnPropertyDescriptor"));
        assert!(script.contains("dispatchEvent(new Event('input'"));
        assert!(script.contains("dispatchEvent(new Event('change'"));
        assert!(script.contains("\"hunter2\""));
        assert!(script.contains("els.length !== 1"));
    }

    #[test]
    fn test_click_script_enforces_single_match() {
        let script = click_script(&Locator::id("submit"));
        assert!(script.contains("els.length !== 1"));
        assert!(script.contains("el.click()"));
    }

    #[test]
    fn test_visible_script_checks_computed_style_and_rect() {
        let script = visible_script(&Locator::role("heading"));
        assert!(script.contains("getComputedStyle"));
        assert!(script.contains("getBoundingClientRect"));
        assert!(script.contains("visible > 0"));
    }
}
