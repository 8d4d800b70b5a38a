mod companding_tests {
    use librawdo::companding::*;
    use librawdo::Companding;

    const ALL_METHODS: [Companding; 5] = [
        Companding::Linear,
        Companding::ULaw,
        Companding::ALaw,
        Companding::InverseULaw,
        Companding::InverseALaw,
    ];

    fn every_byte() -> Vec<u8> {
        (0..=255u8).collect()
    }

    fn distance(a: u8, b: u8) -> i16 {
        (a as i8 as i16 - b as i8 as i16).abs()
    }

    #[test]
    fn test_linear_is_identity() {
        let data = every_byte();
        assert_eq!(apply(&data, Companding::Linear), data);
    }

    #[test]
    fn test_ulaw_codes() {
        assert_eq!(ulaw_compand(0), 0xFF);
        assert_eq!(ulaw_compand(1), 0xE7);
        assert_eq!(ulaw_compand(64), 0x8F);
        assert_eq!(ulaw_compand(127), 0x80);
        assert_eq!(ulaw_compand(0x80), 0x00);
        assert_eq!(ulaw_compand(0xFF), 0x67);
    }

    #[test]
    fn test_alaw_codes() {
        assert_eq!(alaw_compand(0), 0xD5);
        assert_eq!(alaw_compand(1), 0xC5);
        assert_eq!(alaw_compand(64), 0xA5);
        assert_eq!(alaw_compand(127), 0xAA);
        assert_eq!(alaw_compand(0x80), 0x2A);
        assert_eq!(alaw_compand(0xFF), 0x5A);
    }

    #[test]
    fn test_expand_keeps_top_byte() {
        assert_eq!(ulaw_expand(0xFF), 0);
        assert_eq!(ulaw_expand(0x7F), 0);
        assert_eq!(ulaw_expand(0x8F), 65);
        assert_eq!(ulaw_expand(0x80), 125);
        assert_eq!(ulaw_expand(0x00), 130);

        assert_eq!(alaw_expand(0xD5), 0);
        assert_eq!(alaw_expand(0x55), 0xFF);
        assert_eq!(alaw_expand(0xAA), 126);
        assert_eq!(alaw_expand(0x2A), 130);
    }

    #[test]
    fn test_compand_then_expand_stays_close() {
        for sample in every_byte() {
            let u = ulaw_expand(ulaw_compand(sample));
            let a = alaw_expand(alaw_compand(sample));
            assert!(distance(u, sample) <= 2, "u-law moved {sample} to {u}");
            assert!(distance(a, sample) <= 2, "a-law moved {sample} to {a}");
        }
    }

    #[test]
    fn test_coarse_codes_survive_expand_then_compand() {
        for code in every_byte() {
            if (!code & 0x70) >> 4 >= 6 {
                assert_eq!(ulaw_compand(ulaw_expand(code)), code, "u-law {code:#04x}");
            }
            if ((code ^ 0x55) & 0x70) >> 4 >= 5 {
                assert_eq!(alaw_compand(alaw_expand(code)), code, "a-law {code:#04x}");
            }
        }
    }

    #[test]
    fn test_alaw_recompanding_is_stable() {
        for sample in every_byte() {
            let code = alaw_compand(sample);
            assert_eq!(alaw_compand(alaw_expand(code)), code);
        }
    }

    #[test]
    fn test_inverse_round_trip_on_buffers() {
        let data: Vec<u8> = every_byte().into_iter().chain([0, 0, 255, 128]).collect();
        for method in [Companding::ULaw, Companding::ALaw] {
            let back = apply(&apply(&data, method), method.inverse());
            assert_eq!(back.len(), data.len());
            assert!(back.iter().zip(&data).all(|(&b, &d)| distance(b, d) <= 2));
        }
    }

    #[test]
    fn test_curve_is_finer_near_zero() {
        // the 16 smallest positive samples get 16 distinct codes,
        // the 16 largest share a handful
        let small: std::collections::HashSet<u8> = (0..16u8).map(ulaw_compand).collect();
        let large: std::collections::HashSet<u8> = (112..128u8).map(ulaw_compand).collect();
        assert_eq!(small.len(), 16);
        assert!(large.len() < 8);
    }

    #[test]
    fn test_empty_buffer() {
        for method in ALL_METHODS {
            assert!(apply(&[], method).is_empty());
        }
    }

    #[test]
    fn test_methods_differ() {
        let data = every_byte();
        assert_ne!(apply(&data, Companding::ULaw), data);
        assert_ne!(
            apply(&data, Companding::ULaw),
            apply(&data, Companding::ALaw)
        );
    }
}
