//! JavaScript snippets injected through the WebDriver `execute` call.

/// Enumerates the currently visible interactive elements in page order.
/// Returns an array of `{selector, tag, text, placeholder}` records with
/// a CSS path that survives re-querying the element later.
pub const VISIBLE_ELEMENTS: &str = r##"
return (() => {
    const records = [];

    function cssPath(el) {
        if (!(el instanceof Element)) return "";
        const path = [];
        while (el && el.nodeType === Node.ELEMENT_NODE) {
            let selector = el.nodeName.toLowerCase();
            if (el.id) {
                path.unshift(selector + "#" + el.id);
                break;
            }
            let sibling = el;
            let nth = 1;
            while ((sibling = sibling.previousElementSibling)) {
                if (sibling.nodeName.toLowerCase() === selector) nth++;
            }
            if (nth > 1) selector += ":nth-of-type(" + nth + ")";
            path.unshift(selector);
            el = el.parentNode;
        }
        return path.join(" > ");
    }

    function visible(el) {
        if (el.offsetParent === null && el.tagName !== "BODY") return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    }

    const candidates = document.querySelectorAll(
        'a, button, input, textarea, select, [role="button"], [onclick]'
    );
    for (const el of candidates) {
        const tag = el.tagName.toLowerCase();
        if (tag === "input" && (el.getAttribute("type") || "") === "hidden") continue;
        if (!visible(el)) continue;

        let text = (el.innerText || el.value || "").trim();
        if (text.length > 200) text = text.slice(0, 200);

        records.push({
            selector: cssPath(el),
            tag: tag,
            text: text,
            placeholder: el.getAttribute("placeholder") || ""
        });
    }
    return records;
})();
"##;

/// Full visible text of the page, as rendered.
pub const VISIBLE_TEXT: &str = r#"
return document.body ? document.body.innerText : "";
"#;
