//! Criterion benchmarks for frame encoding and the XXTEA cipher.
//!
//! A pointer stream sends one frame per motion step, so encoding plus
//! encryption sits on the hot path of every injected move.
//!
//! Run with:
//! ```bash
//! cargo bench --package kmnet-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kmnet_core::crypto::{xxtea_decrypt, xxtea_encrypt, SessionKey};
use kmnet_core::domain::{KeyboardState, MouseState};
use kmnet_core::protocol::{
    decode_monitor_packet, encode_encrypted_frame, encode_frame, encode_keyboard_report,
    encode_monitor_packet, encode_mouse_report, CommandHeader, CommandId, HardKeyboard, HardMouse,
    ENCRYPTED_FRAME_SIZE,
};

const MAC: u32 = 0x0B50_E466;

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn mouse_payload() -> Vec<u8> {
    let mut mouse = MouseState::new();
    mouse.stage_move(10, -5);
    encode_mouse_report(&mouse.report())
}

fn keyboard_payload() -> Vec<u8> {
    let mut kb = KeyboardState::new();
    kb.press(0xE1);
    kb.press(0x0B);
    encode_keyboard_report(&kb.report())
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_plain_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    let cases = [
        ("MouseMove", CommandId::MouseMove, mouse_payload()),
        ("KeyboardAll", CommandId::KeyboardAll, keyboard_payload()),
        ("ShowPicture", CommandId::ShowPicture, vec![0u8; 1024]),
    ];
    for (name, cmd, payload) in cases {
        let header = CommandHeader::new(MAC, 0, 1, cmd);
        group.bench_with_input(BenchmarkId::new("cmd", name), &payload, |b, payload| {
            b.iter(|| encode_frame(black_box(&header), black_box(payload)).unwrap())
        });
    }
    group.finish();
}

fn bench_encrypted_frames(c: &mut Criterion) {
    let key = SessionKey::from_mac(MAC);
    let header = CommandHeader::new(MAC, 0x1234, 1, CommandId::MouseMove);
    let payload = mouse_payload();

    c.bench_function("encode_encrypted_frame/MouseMove", |b| {
        b.iter(|| encode_encrypted_frame(black_box(&header), black_box(&payload), &key).unwrap())
    });
}

fn bench_cipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("xxtea");
    let key = SessionKey::from_mac(MAC);
    let block = [0xA5u8; ENCRYPTED_FRAME_SIZE];

    group.bench_function("encrypt_128", |b| {
        b.iter(|| {
            let mut buf = block;
            xxtea_encrypt(black_box(&mut buf), &key);
            buf
        })
    });

    group.bench_function("decrypt_128", |b| {
        b.iter(|| {
            let mut buf = block;
            xxtea_decrypt(black_box(&mut buf), &key);
            buf
        })
    });

    group.finish();
}

fn bench_monitor_decode(c: &mut Criterion) {
    let packet = encode_monitor_packet(
        &HardMouse {
            report_id: 1,
            buttons: 0x01,
            x: 3,
            y: -2,
            wheel: 0,
        },
        &HardKeyboard {
            report_id: 2,
            buttons: 0x02,
            keys: [0x0B, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        },
    );

    c.bench_function("decode_monitor_packet", |b| {
        b.iter(|| decode_monitor_packet(black_box(&packet)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_plain_frames,
    bench_encrypted_frames,
    bench_cipher,
    bench_monitor_decode
);
criterion_main!(benches);
