use tiny_skia::Pixmap;

/// Approximates a gaussian blur with three box-blur passes per axis.
///
/// Works directly on the premultiplied bytes: averaging premultiplied
/// channels keeps every channel at or below its alpha. `radius == 0` is a
/// no-op.
pub fn box_blur(pixmap: &mut Pixmap, radius: u32) {
    if radius == 0 {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let radius = radius as usize;
    let data = pixmap.data_mut();
    let mut scratch = vec![0u8; width.max(height) * 4];

    for _ in 0..3 {
        for y in 0..height {
            blur_line(data, y * width * 4, 4, width, radius, &mut scratch);
        }
        for x in 0..width {
            blur_line(data, x * 4, width * 4, height, radius, &mut scratch);
        }
    }
}

/// Blurs `len` pixels starting at byte `start`, `stride` bytes apart.
///
/// Edge pixels are clamped (extended) so the border does not darken.
fn blur_line(
    data: &mut [u8],
    start: usize,
    stride: usize,
    len: usize,
    radius: usize,
    scratch: &mut [u8],
) {
    if len == 0 {
        return;
    }
    let window = (2 * radius + 1) as u32;
    let at = |i: isize| -> usize {
        let clamped = i.clamp(0, len as isize - 1) as usize;
        start + clamped * stride
    };

    let mut sum = [0u32; 4];
    for i in -(radius as isize)..=(radius as isize) {
        let p = at(i);
        for (c, s) in sum.iter_mut().enumerate() {
            *s += u32::from(data[p + c]);
        }
    }

    for i in 0..len {
        for c in 0..4 {
            scratch[i * 4 + c] = ((sum[c] + window / 2) / window) as u8;
        }
        let outgoing = at(i as isize - radius as isize);
        let incoming = at(i as isize + radius as isize + 1);
        for c in 0..4 {
            sum[c] = sum[c] + u32::from(data[incoming + c]) - u32::from(data[outgoing + c]);
        }
    }

    for i in 0..len {
        let p = start + i * stride;
        data[p..p + 4].copy_from_slice(&scratch[i * 4..i * 4 + 4]);
    }
}
