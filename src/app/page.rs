//! Demo page: upload a JSON file, get back a shareable check URL.

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Student Marks API</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
        h1 { color: #333; }
        .panel { margin-top: 30px; }
        label { display: block; margin-bottom: 5px; }
        button { background: #2f7d32; color: white; padding: 10px 15px; border: none; cursor: pointer; }
        button:hover { background: #276a2a; }
        .share-url { margin-top: 20px; padding: 15px; background: #f4f4f4; border-radius: 5px; word-break: break-all; }
    </style>
</head>
<body>
    <h1>Student Marks API</h1>

    <div class="panel">
        <h2>Upload a JSON file</h2>
        <form id="upload-form">
            <label for="file">JSON array of flat objects:</label>
            <input type="file" id="file" accept=".json">
            <p><button type="submit">Convert and generate URL</button></p>
        </form>
        <div id="upload-result"></div>
    </div>

    <script>
        const BASE_URL = __BASE_URL__ || window.location.origin;

        document.getElementById('upload-form').addEventListener('submit', async (event) => {
            event.preventDefault();
            const input = document.getElementById('file');
            if (!input.files.length) {
                alert('Please select a file');
                return;
            }

            const form = new FormData();
            form.append('file', input.files[0]);

            try {
                const response = await fetch('/upload', { method: 'POST', body: form });
                const payload = await response.json();
                if (!response.ok) {
                    alert('Upload failed: ' + payload.error);
                    return;
                }

                const url = `${BASE_URL}/api/${payload.blob}/check`;
                const result = document.getElementById('upload-result');
                result.innerHTML = '';

                const heading = document.createElement('h3');
                heading.textContent = 'API URL';
                const display = document.createElement('div');
                display.className = 'share-url';
                display.textContent = url;
                const copy = document.createElement('button');
                copy.textContent = 'Copy URL';
                copy.addEventListener('click', () => {
                    navigator.clipboard.writeText(url)
                        .then(() => alert('URL copied to clipboard!'))
                        .catch(() => alert('Copy failed, select the URL manually'));
                });

                result.append(heading, display, copy);
            } catch (error) {
                console.error(error);
                alert('An error occurred');
            }
        });
    </script>
</body>
</html>
"#;

/// Render the page with `base_url` baked in as a JS string literal. With no
/// base URL the browser's own origin is used.
pub fn render(base_url: Option<&str>) -> String {
    let literal = base_url
        .and_then(|url| serde_json::to_string(url).ok())
        .map(|quoted| quoted.replace("</", "<\\/"))
        .unwrap_or_else(|| "null".to_string());

    TEMPLATE.replace("__BASE_URL__", &literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_base_url() {
        let html = render(Some("https://marks.example.com"));
        assert!(html.contains(r#"const BASE_URL = "https://marks.example.com" ||"#));
        assert!(!html.contains("__BASE_URL__"));
    }

    #[test]
    fn test_render_without_base_url() {
        let html = render(None);
        assert!(html.contains("const BASE_URL = null || window.location.origin;"));
    }

    #[test]
    fn test_render_escapes_script_close() {
        let html = render(Some("https://x.example.com/</script>"));
        assert!(!html.contains("/</script>\""));
    }
}
