use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_utils::thread;
use rand::Rng;

use chip8_core::{
    chip8::{CYCLES_PER_FRAME, MAX_PROGRAM_SIZE, STACK_SIZE},
    frame::{HEIGHT, WIDTH},
    nb, AudioState, Builder, Chip8, Context, Error, FrameView, OpCode, Quirks, SeededContext,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn chip_with(prog: &[u8]) -> Chip8<SeededContext> {
    init_logger();
    Builder::new()
        .with_context(SeededContext::new(0))
        .with_program(prog)
        .with_trace(true)
        .build()
        .unwrap()
}

fn run<C: Context>(chip: &mut Chip8<C>, steps: usize) {
    for _ in 0..steps {
        chip.tick_chip().unwrap();
    }
}

fn formatted(frame: FrameView<'_>) -> String {
    let mut out = String::new();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            out.push(if frame.get_bit(x, y) == Some(&true) {
                '#'
            } else {
                '.'
            });
        }
        out.push('\n');
    }
    out
}

/// Top left `width`x`height` corner of the screen
fn corner(frame: FrameView<'_>, width: usize, height: usize) -> Vec<String> {
    formatted(frame)
        .lines()
        .take(height)
        .map(|row| row[..width].to_owned())
        .collect()
}

#[test]
fn draws_font_digit() {
    #[rustfmt::skip]
    let prog = [
        0x60, 0x05, // V0 = 5
        0xF0, 0x29, // I = glyph(V0)
        0x61, 0x01, // V1 = 1
        0x62, 0x02, // V2 = 2
        0xD1, 0x25, // draw 5 rows at (V1, V2)
        0x12, 0x0A, // loop
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 6);

    assert_eq!(chip.v(0xF), 0);
    assert_eq!(
        corner(chip.frame(), 6, 8),
        vec![
            "......", //
            "......", //
            ".####.", //
            ".#....", //
            ".####.", //
            "....#.", //
            ".####.", //
            "......", //
        ]
    );
}

#[test]
fn redraw_erases_and_reports_collision() {
    #[rustfmt::skip]
    let prog = [
        0xA2, 0x0A, // I = sprite
        0xD0, 0x01, // draw
        0xD0, 0x01, // draw again
        0x12, 0x06, // loop
        0x00, 0x00,
        0xC3,       // sprite at 0x20A
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 2);
    assert_eq!(chip.frame().count_lit(), 4);
    assert_eq!(chip.v(0xF), 0);

    run(&mut chip, 1);
    assert!(chip.frame().is_blank());
    assert_eq!(chip.v(0xF), 1);
}

#[test]
fn clear_screen() {
    #[rustfmt::skip]
    let prog = [
        0xF0, 0x29, // I = glyph 0
        0xD0, 0x05,
        0x00, 0xE0,
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 2);
    assert!(!chip.frame().is_blank());
    run(&mut chip, 1);
    assert!(chip.frame().is_blank());
}

#[test]
fn bcd_of_register() {
    #[rustfmt::skip]
    let prog = [
        0x60, 0xEA, // V0 = 234
        0xA3, 0x00, // I = 0x300
        0xF0, 0x33, // BCD
        0xF2, 0x65, // V0..=V2 = mem[I..]
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 4);
    assert_eq!(&chip.memory()[0x300..0x303], &[2, 3, 4]);
    assert_eq!(&chip.registers()[..3], &[2, 3, 4]);
}

#[test]
fn registers_survive_store_and_load() {
    let mut rng = rand::thread_rng();
    let values: Vec<u8> = (0..16).map(|_| rng.gen()).collect();

    let mut prog = Vec::new();
    for (x, &value) in values.iter().enumerate() {
        prog.extend_from_slice(&[0x60 | x as u8, value]);
    }
    prog.extend_from_slice(&[0xA4, 0x00, 0xFF, 0x55]);
    for x in 0..16u8 {
        prog.extend_from_slice(&[0x60 | x, 0x00]);
    }
    prog.extend_from_slice(&[0xA4, 0x00, 0xFF, 0x65]);

    let mut chip = chip_with(&prog);
    run(&mut chip, 16 + 2);
    assert_eq!(&chip.memory()[0x400..0x410], &values[..]);
    run(&mut chip, 16);
    assert_eq!(chip.registers(), &[0; 16]);
    run(&mut chip, 2);
    assert_eq!(&chip.registers()[..], &values[..]);
    assert_eq!(chip.i(), 0x400);
}

#[test]
fn subroutine_call_and_return() {
    #[rustfmt::skip]
    let prog = [
        0x22, 0x06, // call 0x206
        0x61, 0x02, // V1 = 2
        0x12, 0x04, // loop
        0x60, 0x01, // V0 = 1
        0x00, 0xEE, // return
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 1);
    assert_eq!((chip.pc(), chip.sp()), (0x206, 1));
    assert_eq!(chip.stack(), &[0x202]);
    run(&mut chip, 2);
    assert_eq!((chip.pc(), chip.sp()), (0x202, 0));
    run(&mut chip, 1);
    assert_eq!((chip.v(0), chip.v(1)), (1, 2));
}

#[test]
fn runaway_recursion_overflows_stack() {
    let mut chip = chip_with(&[0x22, 0x00]);
    run(&mut chip, STACK_SIZE);
    assert_eq!(
        chip.tick_chip(),
        Err(nb::Error::Other(Error::StackOverflow { addr: 0x200 }))
    );
    assert_eq!(chip.pc(), 0x200);
    assert_eq!(chip.sp(), STACK_SIZE);
    assert_eq!(chip.run_frame(), Err(Error::StackOverflow { addr: 0x200 }));
}

#[test]
fn unknown_instruction_is_skipped() {
    let mut chip = chip_with(&[0xFF, 0xFF, 0x60, 0x07]);
    assert_eq!(chip.tick_chip(), Ok(OpCode::Unknown { raw: 0xFFFF }));
    run(&mut chip, 1);
    assert_eq!(chip.v(0), 7);
}

#[test]
fn waits_for_key_press() {
    #[rustfmt::skip]
    let prog = [
        0xF5, 0x0A, // V5 = key
        0x60, 0x01,
    ];
    let mut chip = chip_with(&prog);
    for _ in 0..3 {
        assert_eq!(chip.tick_chip(), Err(nb::Error::WouldBlock));
        assert_eq!(chip.pc(), 0x200);
    }

    let mut keys = [false; 16];
    keys[0xB] = true;
    chip.set_keys(keys);
    run(&mut chip, 2);
    assert_eq!((chip.v(5), chip.v(0)), (0xB, 1));
}

#[test]
fn skips_on_key_state() {
    #[rustfmt::skip]
    let prog = [
        0x60, 0x04, // V0 = 4
        0xE0, 0x9E, // skip if key V0 down
        0x61, 0x01, // V1 = 1
        0xE0, 0xA1, // skip if key V0 up
        0x62, 0x01, // V2 = 1
    ];
    let mut chip = chip_with(&prog);
    let mut keys = [false; 16];
    keys[4] = true;
    chip.set_keys(keys);
    run(&mut chip, 3);
    assert_eq!(chip.pc(), 0x208);
    assert_eq!(chip.v(1), 0);
    run(&mut chip, 1);
    assert_eq!(chip.v(2), 1);
}

#[test]
fn delay_timer_counts_down() {
    #[rustfmt::skip]
    let prog = [
        0x65, 0x05, // V5 = 5
        0xF5, 0x15, // delay = V5
        0xF6, 0x07, // V6 = delay
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 2);
    assert_eq!(chip.delay_timer(), 5);
    for _ in 0..5 {
        chip.tick_timers();
    }
    run(&mut chip, 1);
    assert_eq!(chip.v(6), 0);
    chip.tick_timers();
    assert_eq!(chip.delay_timer(), 0);
}

#[test]
fn frame_runs_fixed_batch() {
    let mut prog = Vec::new();
    for _ in 0..CYCLES_PER_FRAME * 3 {
        prog.extend_from_slice(&[0x70, 0x01]);
    }
    let mut chip = chip_with(&prog);
    chip.run_frame().unwrap();
    chip.run_frame().unwrap();
    assert_eq!(chip.v(0) as usize, 2 * CYCLES_PER_FRAME);
    assert_eq!(chip.pc() as usize, 0x200 + 4 * CYCLES_PER_FRAME);
}

#[test]
fn sound_flag_is_visible_from_audio_thread() {
    #[rustfmt::skip]
    let prog = [
        0x60, 0x03, // V0 = 3
        0xF0, 0x18, // sound = V0
        0x12, 0x04, // loop
    ];
    let mut chip = chip_with(&prog);
    let flag = chip.sound_flag();
    let heard = AtomicBool::new(false);

    thread::scope(|s| {
        let heard = &heard;
        s.spawn(move |_| {
            let started = Instant::now();
            let mut state = AudioState::default();
            let mut buffer = [0i16; 64];
            while started.elapsed() < Duration::from_secs(5) {
                state.fill(flag.is_active(), &mut buffer);
                if buffer.iter().any(|&sample| sample != 0) {
                    heard.store(true, Ordering::Release);
                    break;
                }
            }
        });

        let chip = &mut chip;
        s.spawn(move |_| {
            let started = Instant::now();
            chip.run_frame().unwrap();
            while !heard.load(Ordering::Acquire) && started.elapsed() < Duration::from_secs(5) {
                std::thread::yield_now();
            }
            for _ in 0..3 {
                chip.run_frame().unwrap();
            }
        });
    })
    .unwrap();

    assert!(heard.load(Ordering::Acquire));
    assert_eq!(chip.sound_timer(), 0);
    assert!(!chip.sound_flag().is_active());
}

#[test]
fn random_is_masked_and_reproducible() {
    let prog = [0xC0, 0x0F, 0xC1, 0xFF, 0x12, 0x00];
    let mut lhs = chip_with(&prog);
    let mut rhs = chip_with(&prog);
    for _ in 0..32 {
        run(&mut lhs, 3);
        run(&mut rhs, 3);
        assert_eq!(lhs.v(0) & 0xF0, 0);
        assert_eq!(lhs.registers(), rhs.registers());
    }
}

#[test]
fn borrowed_context_keeps_its_sequence() {
    init_logger();
    let mut reference = SeededContext::new(3);
    let expected: Vec<u8> = (0..3).map(|_| reference.gen_random()).collect();

    let mut ctx = SeededContext::new(3);
    {
        // VA = rand, VB = rand
        let mut chip = Chip8::load(&mut ctx, &[0xCA, 0xFF, 0xCB, 0xFF]);
        run(&mut chip, 2);
        assert_eq!((chip.v(0xA), chip.v(0xB)), (expected[0], expected[1]));
    }
    assert_eq!(ctx.gen_random(), expected[2]);
}

#[test]
fn font_survives_program_writes() {
    #[rustfmt::skip]
    let prog = [
        0x60, 0xFF, // V0 = 0xFF
        0xA0, 0x50, // I = font
        0xF0, 0x55, // mem[I] = V0
        0xF0, 0x33, // BCD of V0
    ];
    let mut chip = chip_with(&prog);
    run(&mut chip, 4);
    assert_eq!(&chip.memory()[0x050..0x053], &[0xF0, 0x90, 0x90]);
}

#[test]
fn cosmac_quirks_from_builder() {
    init_logger();
    #[rustfmt::skip]
    let prog = [
        0x61, 0x81, // V1 = 0x81
        0x80, 0x16, // V0 = V1 >> 1
        0xA3, 0x00,
        0xF1, 0x55, // I advances
        0x00, 0xEE, // halts on empty stack
    ];
    let mut chip = Builder::new()
        .with_context(SeededContext::new(0))
        .with_program(&prog)
        .with_quirks(Quirks::COSMAC)
        .build()
        .unwrap();
    for _ in 0..4 {
        chip.tick_chip().unwrap();
    }
    assert_eq!((chip.v(0), chip.v(1), chip.v(0xF)), (0x40, 0x81, 1));
    assert_eq!(chip.i(), 0x302);
    assert_eq!(
        chip.tick_chip(),
        Err(nb::Error::Other(Error::StackUnderflow))
    );
    assert_eq!(chip.pc(), 0x208);
}

#[test]
fn oversized_program_is_truncated() {
    init_logger();
    let prog = vec![0x12; MAX_PROGRAM_SIZE + 100];
    let mut chip = Chip8::new(SeededContext::new(0));
    assert_eq!(chip.load_program(&prog), MAX_PROGRAM_SIZE);
    assert_eq!(chip.memory().len(), 4096);
    assert_eq!(chip.memory()[0xFFF], 0x12);
}
