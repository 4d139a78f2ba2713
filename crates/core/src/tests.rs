#[cfg(test)]
mod tests {
    use crate::flag::ClobberFlag;
    use crate::hex::print_hex;
    use crate::region::{AtomicScratch, ScratchRegion, REGION_LEN};
    use crate::reporter::{Reporter, LABEL_CORE, LABEL_COUNTER, LINE_END, NOTICE_CLOBBERING};
    use crate::sim;
    use crate::worker::ClobberWorker;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn format_hex(value: u32) -> String {
        let mut out = Vec::new();
        print_hex(&mut out, value);
        String::from_utf8(out).unwrap()
    }

    fn collect_lines(sink: &[u8]) -> Vec<String> {
        let text = String::from_utf8(sink.to_vec()).unwrap();
        assert!(text.ends_with(LINE_END));
        text.split(LINE_END)
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_hex_zero_is_single_digit() {
        assert_eq!(format_hex(0), "0");
    }

    #[test]
    fn test_hex_known_values() {
        assert_eq!(format_hex(0x1), "1");
        assert_eq!(format_hex(0xF), "f");
        assert_eq!(format_hex(0x10), "10");
        assert_eq!(format_hex(0xFF), "ff");
        assert_eq!(format_hex(0x100), "100");
        assert_eq!(format_hex(0xA0_0B00), "a00b00");
        assert_eq!(format_hex(0xDEAD_BEEF), "deadbeef");
        assert_eq!(format_hex(0xFFFF_FFFF), "ffffffff");
    }

    #[test]
    fn test_hex_round_trip() {
        // A deterministic xorshift walk plus the edge values.
        let mut samples = vec![0u32, 1, 9, 0x10, 0xFF, 0x8000_0000, u32::MAX];
        let mut x = 0x1234_5678u32;
        for _ in 0..4096 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            samples.push(x);
        }

        for n in samples {
            let rendered = format_hex(n);
            assert!(!rendered.is_empty());
            assert!(rendered.len() <= 8);
            assert_eq!(u32::from_str_radix(&rendered, 16).unwrap(), n);
            // Agrees with the standard formatter.
            assert_eq!(rendered, format!("{:x}", n));
        }
    }

    #[test]
    fn test_flag_starts_lowered() {
        let flag = ClobberFlag::new();
        assert!(!flag.is_raised());
    }

    #[test]
    fn test_flag_raise_sticks() {
        let flag = ClobberFlag::new();
        flag.raise();
        assert!(flag.is_raised());
        flag.raise();
        assert!(flag.is_raised());
    }

    #[test]
    fn test_region_bump_wraps_at_byte() {
        let region = AtomicScratch::new();
        for _ in 0..256 {
            region.bump(7);
        }
        // 256 increments of one byte wrap back to the starting value.
        let snap = region.snapshot();
        assert_eq!(snap[7], 0);

        for _ in 0..300 {
            region.bump(7);
        }
        assert_eq!(region.snapshot()[7], 44);
    }

    #[test]
    fn test_worker_raises_flag_before_first_write() {
        struct ProbeRegion<'a> {
            flag: &'a ClobberFlag,
            flag_up_at_first_bump: Cell<Option<bool>>,
        }

        impl ScratchRegion for ProbeRegion<'_> {
            fn bump(&self, _offset: u8) {
                if self.flag_up_at_first_bump.get().is_none() {
                    self.flag_up_at_first_bump.set(Some(self.flag.is_raised()));
                }
            }

            fn snapshot(&self) -> [u8; REGION_LEN] {
                [0; REGION_LEN]
            }
        }

        let flag = ClobberFlag::new();
        let probe = ProbeRegion {
            flag: &flag,
            flag_up_at_first_bump: Cell::new(None),
        };

        ClobberWorker::new().run(&probe, &flag, || true);
        assert_eq!(probe.flag_up_at_first_bump.get(), Some(true));
    }

    #[test]
    fn test_worker_offset_wraps_and_overlaps() {
        let region = AtomicScratch::new();
        let flag = ClobberFlag::new();
        let mut worker = ClobberWorker::new();

        let mut remaining = 300u32;
        worker.run(&region, &flag, || {
            remaining -= 1;
            remaining == 0
        });

        assert_eq!(worker.offset(), 44); // 300 % 256
        let snap = region.snapshot();
        for (i, byte) in snap.iter().enumerate() {
            let expected = if i < 44 { 2 } else { 1 };
            assert_eq!(*byte, expected, "offset {}", i);
        }
    }

    #[test]
    fn test_worker_covers_region_k_times() {
        let region = AtomicScratch::new();
        let flag = ClobberFlag::new();
        let before = region.snapshot();

        let k = 3u32;
        let mut remaining = k * REGION_LEN as u32;
        ClobberWorker::new().run(&region, &flag, || {
            remaining -= 1;
            remaining == 0
        });

        // Only the delta is constrained; the starting contents are not.
        let after = region.snapshot();
        for i in 0..REGION_LEN {
            let delta = after[i].wrapping_sub(before[i]);
            assert!(delta >= k as u8, "offset {} bumped {} times", i, delta);
        }
    }

    #[test]
    fn test_report_line_shape_and_counter_law() {
        let flag = ClobberFlag::new();
        let mut reporter = Reporter::new();
        let mut out = Vec::new();

        for _ in 0..3 {
            reporter.emit_line(&mut out, &flag, 0);
        }

        let lines = collect_lines(&out);
        assert_eq!(lines.len(), 3);
        for (k, line) in lines.iter().enumerate() {
            assert_eq!(
                line,
                &format!("{}{}{}0", LABEL_COUNTER, format_hex(k as u32), LABEL_CORE)
            );
            assert!(!line.contains(NOTICE_CLOBBERING));
        }
        assert_eq!(reporter.counter(), 3);
    }

    #[test]
    fn test_report_line_carries_notice_once_flag_is_up() {
        let flag = ClobberFlag::new();
        flag.raise();
        let mut reporter = Reporter::new();
        let mut out = Vec::new();
        reporter.emit_line(&mut out, &flag, 1);

        let lines = collect_lines(&out);
        assert_eq!(
            lines[0],
            format!("{}0{}1{}", LABEL_COUNTER, LABEL_CORE, NOTICE_CLOBBERING)
        );
    }

    #[test]
    fn test_counter_wraps_to_zero() {
        let flag = ClobberFlag::new();
        let mut reporter = Reporter::with_counter(u32::MAX);
        let mut out = Vec::new();
        reporter.emit_line(&mut out, &flag, 0);
        reporter.emit_line(&mut out, &flag, 0);

        let lines = collect_lines(&out);
        assert!(lines[0].contains("0xffffffff"));
        assert!(lines[1].contains("0x0 "));
        assert_eq!(reporter.counter(), 1);
    }

    #[test]
    fn test_run_reads_core_id_fresh_each_iteration() {
        let flag = ClobberFlag::new();
        let mut reporter = Reporter::new();
        let mut out = Vec::new();

        let calls = Cell::new(0u8);
        let mut lines_left = 4;
        reporter.run(
            &mut out,
            &flag,
            || {
                let id = calls.get() % 2;
                calls.set(calls.get() + 1);
                id
            },
            || {
                lines_left -= 1;
                lines_left == 0
            },
        );

        let lines = collect_lines(&out);
        assert_eq!(lines.len(), 4);
        for (k, line) in lines.iter().enumerate() {
            let digit = char::from(b'0' + (k as u8 % 2));
            assert!(line.ends_with(&format!("{}{}", LABEL_CORE, digit)));
        }
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_end_to_end_worker_start_window() {
        let region = Arc::new(AtomicScratch::new());
        let flag = Arc::new(ClobberFlag::new());
        let mut reporter = Reporter::new();
        let mut out = Vec::new();

        // Before the worker exists, lines are quiet and count 0x0, 0x1, 0x2.
        for _ in 0..3 {
            reporter.emit_line(&mut out, &flag, 0);
        }
        let lines = collect_lines(&out);
        assert_eq!(lines[0], format!("{}0{}0", LABEL_COUNTER, LABEL_CORE));
        assert_eq!(lines[1], format!("{}1{}0", LABEL_COUNTER, LABEL_CORE));
        assert_eq!(lines[2], format!("{}2{}0", LABEL_COUNTER, LABEL_CORE));
        assert!(lines.iter().all(|l| !l.contains(NOTICE_CLOBBERING)));

        let handle = sim::spawn_worker(region.clone(), flag.clone(), Duration::ZERO);

        // The exact interleaving point is non-deterministic; tolerate a
        // bounded window before the notice shows up, then require it to
        // stick.
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut noticed_at = None;
        while noticed_at.is_none() {
            assert!(Instant::now() < deadline, "notice never appeared");
            let mut line = Vec::new();
            reporter.emit_line(&mut line, &flag, 0);
            if collect_lines(&line)[0].contains(NOTICE_CLOBBERING) {
                noticed_at = Some(reporter.counter());
            }
        }

        for _ in 0..10 {
            let mut line = Vec::new();
            reporter.emit_line(&mut line, &flag, 0);
            assert!(collect_lines(&line)[0].contains(NOTICE_CLOBBERING));
        }

        let stats = handle.stop().unwrap();
        assert!(stats.iterations > 0);
        // The region visibly changed somewhere.
        assert!(region.snapshot().iter().any(|&b| b != 0));
    }

    #[test]
    fn test_sim_worker_stop_returns_stats() {
        let region = Arc::new(AtomicScratch::new());
        let flag = Arc::new(ClobberFlag::new());
        let handle = sim::spawn_worker(region, flag, Duration::ZERO);

        while handle.iterations() < 512 {
            std::thread::yield_now();
        }

        let stats = handle.stop().unwrap();
        assert!(stats.iterations >= 512);
        assert_eq!(stats.final_offset as u64, stats.iterations % 256);
    }
}
