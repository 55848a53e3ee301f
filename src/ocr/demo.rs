use crate::error::RecognizerError;
use crate::ocr::{ImageVariant, Recognizer};

const SAMPLE_FIRS: [&str; 3] = [
    "प्राथमिकी संख्या: 123/2024
थाना: कोतवाली, दिल्ली
दिनांक: 15 जनवरी 2024
समय: रात्रि 10:30 बजे

अभियुक्त का नाम: राम कुमार
पिता का नाम: श्याम लाल
निवास: गली नंबर 5, करोल बाग, दिल्ली

पीड़ित का नाम: सुनीता देवी
पिता का नाम: मोहन लाल
निवास: हाउस नंबर 42, लाजपत नगर, दिल्ली

घटना का विवरण: दिनांक 15.01.2024 को रात्रि लगभग 10:30 बजे अभियुक्त राम कुमार द्वारा पीड़िता सुनीता देवी के साथ मारपीट की गई। अभियुक्त ने पीड़िता के गहने छीनने का प्रयास किया।

धारा: भारतीय दंड संहिता की धारा 323, 379
पुलिस अधिकारी: सब इंस्पेक्टर अजय शर्मा",
    "प्राथमिकी संख्या: 456/2024
थाना: सदर बाजार, मुंबई
दिनांक: 20 फरवरी 2024
समय: दोपहर 2:15 बजे

अभियुक्त का नाम: विकास गुप्ता
पिता का नाम: राजेश गुप्ता

पीड़ित का नाम: प्रिया शर्मा
पिता का नाम: सुरेश शर्मा

घटना का विवरण: दिनांक 20.02.2024 को दोपहर लगभग 2:15 बजे अभियुक्त विकास गुप्ता द्वारा पीड़िता प्रिया शर्मा के मोबाइल फोन को छीनने का प्रयास किया गया।

धारा: भारतीय दंड संहिता की धारा 356, 323
पुलिस अधिकारी: हेड कांस्टेबल रमेश पाटिल",
    "प्राथमिकी संख्या: 789/2024
थाना: सिविल लाइन्स, जयपुर
दिनांक: 5 मार्च 2024
समय: शाम 6:45 बजे

अभियुक्त का नाम: अमित वर्मा
पिता का नाम: सुनील वर्मा

पीड़ित का नाम: अनिता गुप्ता
पति का नाम: राहुल गुप्ता

घटना का विवरण: दिनांक 05.03.2024 को शाम लगभग 6:45 बजे अभियुक्त अमित वर्मा द्वारा पीड़िता अनिता गुप्ता के पर्स को छीनने का प्रयास किया गया। अभियुक्त मोटरसाइकिल पर सवार था।

धारा: भारतीय दंड संहिता की धारा 392, 511
पुलिस अधिकारी: एएसआई मनोज कुमार",
];

/// Offline stand-in that cycles through sample FIR transcripts.
///
/// Every call advances the rotation, whatever image it is given.
#[derive(Debug, Default)]
pub struct DemoRecognizer {
    next: usize,
}

impl DemoRecognizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recognizer for DemoRecognizer {
    fn name(&self) -> &str {
        "demo"
    }

    fn recognize(&mut self, _variant: &ImageVariant) -> Result<String, RecognizerError> {
        let text = SAMPLE_FIRS[self.next % SAMPLE_FIRS.len()];
        self.next = self.next.wrapping_add(1);
        Ok(text.to_string())
    }
}
