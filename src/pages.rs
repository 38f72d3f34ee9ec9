// Pages Module - HTML templates for the control panel
use crate::types::{HsvParams, Mode, Preset};

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Ubuntu, sans-serif;
            background: #1a1a1a;
            color: #e0e0e0;
            padding: 20px;
            line-height: 1.6;
        }
        .container { max-width: 700px; margin: 0 auto; }
        h1 { color: #00aaff; margin-bottom: 24px; font-size: 2em; }
        .section {
            background: #2a2a2a;
            border: 1px solid #404040;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 20px;
        }
        .config-item { margin-bottom: 12px; }
        .config-item label {
            display: block;
            color: #b0b0b0;
            margin-bottom: 4px;
            font-size: 0.9em;
            text-transform: uppercase;
            letter-spacing: 0.5px;
        }
        .input-group { display: flex; gap: 10px; align-items: center; }
        input[type="range"] { flex: 1; cursor: pointer; touch-action: none; }
        .range-value { min-width: 50px; text-align: center; color: #00aaff; font-weight: 600; }
        .mode { color: #00aaff; font-weight: 600; text-transform: uppercase; }
        a, button {
            display: inline-block;
            background: #00aaff;
            color: white;
            border: none;
            padding: 10px 20px;
            border-radius: 4px;
            cursor: pointer;
            font-size: 0.9em;
            font-weight: 600;
            text-decoration: none;
            margin-right: 8px;
        }
        a:hover, button:hover { background: #0088cc; }
        .message {
            position: fixed;
            top: 20px;
            right: 20px;
            padding: 15px 20px;
            border-radius: 4px;
            opacity: 0;
            transition: opacity 0.3s;
        }
        .message.show { opacity: 1; }
        .message.success { background: #2d5016; border: 1px solid #4a8028; color: #a3d977; }
        .message.error { background: #5a1a1a; border: 1px solid #902020; color: #ff9090; }
"#;

const SCRIPT: &str = r#"
        function showMessage(text, kind) {
            const el = document.getElementById('message');
            el.textContent = text;
            el.className = 'message show ' + kind;
            setTimeout(() => { el.className = 'message'; }, 2500);
        }

        async function post(url, body, successText) {
            try {
                const res = await fetch(url, {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body || {})
                });
                const data = await res.json();
                if (data.did) {
                    showMessage(successText || 'Done', 'success');
                } else {
                    showMessage(data.error || 'Request failed', 'error');
                }
                return data;
            } catch (e) {
                showMessage('Request failed: ' + e, 'error');
            }
        }
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vision Control</title>
    <style>{{style}}</style>
</head>
<body>
    <div class="container">
        <h1>Vision Control</h1>
        <div class="section">
            <p>Device: <strong>{{device_address}}</strong></p>
            <p>Mode: <span class="mode" id="mode">{{mode}}</span></p>
        </div>
        <div class="section">
            <a href="/tune">Tune</a>
            <button onclick="restartVision()">Restart</button>
            <button onclick="post('/runvision', {}, 'Running')">Run</button>
        </div>
    </div>
    <div id="message" class="message"></div>
    <script>{{script}}
        async function restartVision() {
            await post('/restart', {}, 'Restarting');
            refreshMode();
        }

        async function refreshMode() {
            const res = await fetch('/api/mode');
            const data = await res.json();
            document.getElementById('mode').textContent = data.mode;
            if (data.mode === 'restart') {
                setTimeout(refreshMode, 500);
            }
        }
    </script>
</body>
</html>
"#;

const TUNE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Tune</title>
    <style>{{style}}</style>
</head>
<body>
    <div class="container">
        <h1>Tune</h1>
        <div class="section">
            <a href="/tune/cone">Cones</a>
            <a href="/tune/cube">Cubes</a>
        </div>
        <div class="section">
            <a href="/">Back</a>
        </div>
    </div>
</body>
</html>
"#;

const PRESET_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>{{style}}</style>
</head>
<body>
    <div class="container">
        <h1>{{title}}</h1>
        <div class="section" id="sliders">
{{sliders}}
        </div>
        <div class="section">
            <button onclick="save()">Save</button>
            <a href="/tune">Back</a>
        </div>
    </div>
    <div id="message" class="message"></div>
    <script>{{script}}
        const FIELDS = {{fields}};

        document.querySelectorAll('input[type="range"]').forEach(input => {
            input.addEventListener('input', () => {
                document.getElementById(input.id + '_value').textContent = input.value;
            });
        });

        function save() {
            const body = {};
            FIELDS.forEach(f => { body[f] = document.getElementById(f).value; });
            post('{{send_route}}', body, 'Saved');
        }
    </script>
</body>
</html>
"#;

/// Minimal escaping for values interpolated into HTML text
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn slider(field: &str, value: u16, max: u16) -> String {
    format!(
        r#"            <div class="config-item">
                <label for="{field}">{label}</label>
                <div class="input-group">
                    <input type="range" id="{field}" min="0" max="{max}" value="{value}">
                    <span class="range-value" id="{field}_value">{value}</span>
                </div>
            </div>"#,
        field = field,
        label = field.replace('_', " "),
        max = max,
        value = value,
    )
}

pub fn render_index(mode: Mode, device_address: &str) -> String {
    INDEX_HTML
        .replace("{{style}}", STYLE)
        .replace("{{script}}", SCRIPT)
        .replace("{{mode}}", mode.as_str())
        .replace("{{device_address}}", &escape_html(device_address))
}

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Error</title>
    <style>{{style}}</style>
</head>
<body>
    <div class="container">
        <h1>Something went wrong</h1>
        <div class="section">
            <p>{{message}}</p>
        </div>
        <div class="section">
            <a href="/">Home</a>
        </div>
    </div>
</body>
</html>
"#;

pub fn render_error(message: &str) -> String {
    ERROR_HTML
        .replace("{{style}}", STYLE)
        .replace("{{message}}", &escape_html(message))
}

pub fn render_tune() -> String {
    TUNE_HTML.replace("{{style}}", STYLE)
}

pub fn render_preset(preset: Preset, params: &HsvParams) -> String {
    let sliders: Vec<String> = HsvParams::FIELDS
        .iter()
        .zip(params.values())
        .enumerate()
        .map(|(i, (field, value))| slider(field, value, HsvParams::limit(i)))
        .collect();

    let fields = format!(
        "[{}]",
        HsvParams::FIELDS
            .iter()
            .map(|f| format!("'{}'", f))
            .collect::<Vec<_>>()
            .join(", ")
    );

    PRESET_HTML
        .replace("{{style}}", STYLE)
        .replace("{{script}}", SCRIPT)
        .replace("{{title}}", preset.title())
        .replace("{{sliders}}", &sliders.join("\n"))
        .replace("{{fields}}", &fields)
        .replace("{{send_route}}", preset.send_route())
}
