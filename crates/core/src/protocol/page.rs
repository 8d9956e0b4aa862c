/// Browser UI served at `/`: the live stream plus one input per sensor control.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>camstream</title>
<style>
  body { font-family: sans-serif; margin: 0; display: flex; flex-wrap: wrap; }
  #view { flex: 1 1 640px; padding: 8px; }
  #view img { width: 100%; max-width: 800px; background: #222; }
  #controls { flex: 0 0 280px; padding: 8px; }
  .row { display: flex; justify-content: space-between; align-items: center; margin: 6px 0; }
  .row label { flex: 0 0 120px; }
  #result { font-size: 0.8em; color: #a00; min-height: 1em; }
</style>
</head>
<body>
<div id="view"><img id="stream" src="/stream" alt="stream"></div>
<div id="controls">
  <div class="row"><label for="resolution">Resolution</label>
    <select id="resolution">
      <option value="QQVGA">QQVGA 160x120</option>
      <option value="QVGA">QVGA 320x240</option>
      <option value="VGA" selected>VGA 640x480</option>
      <option value="SVGA">SVGA 800x600</option>
    </select></div>
  <div class="row"><label for="brightness">Brightness</label><input type="range" id="brightness" min="-2" max="2" value="0"></div>
  <div class="row"><label for="contrast">Contrast</label><input type="range" id="contrast" min="-2" max="2" value="2"></div>
  <div class="row"><label for="saturation">Saturation</label><input type="range" id="saturation" min="-2" max="2" value="0"></div>
  <div class="row"><label for="sharpness">Sharpness</label><input type="range" id="sharpness" min="-2" max="2" value="2"></div>
  <div class="row"><label for="special_effect">Effect</label>
    <select id="special_effect">
      <option value="0">None</option><option value="1">Negative</option>
      <option value="2">Grayscale</option><option value="3">Red tint</option>
      <option value="4">Green tint</option><option value="5">Blue tint</option>
      <option value="6">Sepia</option>
    </select></div>
  <div class="row"><label for="aec">Auto exposure</label><input type="checkbox" id="aec" checked></div>
  <div class="row"><label for="aec_value">Exposure</label><input type="range" id="aec_value" min="0" max="1200" value="300"></div>
  <div class="row"><label for="agc">Auto gain</label><input type="checkbox" id="agc" checked></div>
  <div class="row"><label for="agc_gain">Gain</label><input type="range" id="agc_gain" min="0" max="30" value="0"></div>
  <div class="row"><label for="awb">Auto WB</label><input type="checkbox" id="awb" checked></div>
  <div class="row"><label for="awb_gain">AWB gain</label><input type="checkbox" id="awb_gain" checked></div>
  <div class="row"><label for="vflip">V-flip</label><input type="checkbox" id="vflip"></div>
  <div class="row"><label for="hmirror">H-mirror</label><input type="checkbox" id="hmirror"></div>
  <div class="row"><label for="colorbar">Color bar</label><input type="checkbox" id="colorbar"></div>
  <div id="result"></div>
</div>
<script>
  function setParam(name, value) {
    fetch('/control?var=' + encodeURIComponent(name) + '&val=' + encodeURIComponent(value) + '&t=' + Date.now())
      .then(r => r.text().then(t => { document.getElementById('result').textContent = r.ok ? '' : name + ': ' + t; }))
      .catch(e => { document.getElementById('result').textContent = String(e); });
  }
  document.querySelectorAll('#controls input, #controls select').forEach(el => {
    const ev = el.type === 'range' ? 'input' : 'change';
    el.addEventListener(ev, () => setParam(el.id, el.type === 'checkbox' ? (el.checked ? 1 : 0) : el.value));
  });
  fetch('/status').then(r => r.text()).then(text => {
    text.split('\n').forEach(line => {
      const [key, value] = line.split('=');
      const el = document.getElementById(key);
      if (!el) return;
      if (el.type === 'checkbox') el.checked = value === '1'; else el.value = value;
    });
  });
</script>
</body>
</html>
"#;
