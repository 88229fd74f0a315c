pub const CHAT_HELP_TEXT: &str = r#"Conversa
========

  say <texto>       Envia uma mensagem no atendimento ativo.
  chat              Entra no modo conversa. Cada linha é enviada como mensagem.

Dentro do modo conversa:
  /file <caminho>   Seleciona um arquivo
  /caption <texto>  Define a legenda do arquivo sem enviar mensagem
  /send             Envia o arquivo selecionado
  /cancel           Descarta o arquivo selecionado
  /end              Encerra o atendimento (pede confirmação)
  /quit             Volta ao modo de comandos

Mensagens em branco são ignoradas; o texto é limitado a 1000 caracteres.
"#;
